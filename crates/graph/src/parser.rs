//! AI response → canvas graph.
//!
//! Input is the assistant's loosely-typed generation payload:
//!
//! ```json
//! { "nodes": [{ "id"?, "integration", "name", "type", "position"?, "config"? }],
//!   "connections": [{ "source", "target" }] }
//! ```
//!
//! There is no error path.  Missing ids and positions are synthesised,
//! everything else falls back to an empty or absent value.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::entropy::Entropy;
use crate::models::{
    IntegrationRef, NodeConfig, NodeData, NodeType, Position, StepKind, WorkflowEdge, WorkflowNode,
};

/// Synthesised positions fall in `[X_MIN, X_MIN + X_SPAN) x [Y_MIN, Y_MIN + Y_SPAN)`.
pub const X_MIN: f64 = 100.0;
pub const X_SPAN: f64 = 400.0;
pub const Y_MIN: f64 = 100.0;
pub const Y_SPAN: f64 = 300.0;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Nodes and edges materialised from one AI response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGraph {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

/// Convert an AI generation payload into canvas nodes and edges.
///
/// Returns `None` when `nodes` is missing or not an array; callers must
/// treat that as "leave the canvas alone".
pub fn parse_ai_response(response: &Value, entropy: &mut dyn Entropy) -> Option<ParsedGraph> {
    let Some(raw_nodes) = response.get("nodes").and_then(Value::as_array) else {
        debug!("AI response has no node list; nothing to materialise");
        return None;
    };

    let mut seen: HashSet<String> = HashSet::with_capacity(raw_nodes.len());
    let nodes = raw_nodes
        .iter()
        .map(|raw| materialise_node(raw, entropy, &mut seen))
        .collect();

    let edges = response
        .get("connections")
        .and_then(Value::as_array)
        .map(|raw| {
            raw.iter()
                .enumerate()
                .map(|(index, conn)| materialise_edge(index, conn))
                .collect()
        })
        .unwrap_or_default();

    Some(ParsedGraph { nodes, edges })
}

fn materialise_node(raw: &Value, entropy: &mut dyn Entropy, seen: &mut HashSet<String>) -> WorkflowNode {
    let id = match non_empty_str(raw.get("id")) {
        Some(id) => {
            if seen.contains(id) {
                warn!("AI response repeats node id '{}'", id);
            }
            id.to_owned()
        }
        None => loop {
            // Re-draw until the id is new to this batch.
            let candidate = synthesise_node_id(entropy);
            if !seen.contains(&candidate) {
                break candidate;
            }
        },
    };
    seen.insert(id.clone());

    let position = raw
        .get("position")
        .and_then(read_position)
        .unwrap_or_else(|| synthesise_position(entropy));

    let integration_id = match raw.get("integration") {
        Some(Value::String(s)) => s.clone(),
        Some(obj @ Value::Object(_)) => non_empty_str(obj.get("id")).unwrap_or_default().to_owned(),
        _ => String::new(),
    };
    let name = non_empty_str(raw.get("name"))
        .map(str::to_owned)
        .unwrap_or_else(|| integration_id.clone());
    let kind = StepKind::from_loose(raw.get("type").and_then(Value::as_str));

    let config = match raw.get("config") {
        Some(Value::Object(map)) => map.clone(),
        _ => NodeConfig::new(),
    };

    WorkflowNode {
        id,
        node_type: NodeType::IntegrationNode,
        position,
        data: NodeData {
            integration: IntegrationRef::unresolved(integration_id, name.clone(), kind),
            config,
            label: name,
            is_configured: false,
        },
    }
}

fn materialise_edge(index: usize, raw: &Value) -> WorkflowEdge {
    let source = raw.get("source").and_then(Value::as_str).map(str::to_owned);
    let target = raw.get("target").and_then(Value::as_str).map(str::to_owned);
    WorkflowEdge::new(format!("edge-{index}"), source, target)
}

/// `node-<millis>-<9 base36 chars>`
pub fn synthesise_node_id(entropy: &mut dyn Entropy) -> String {
    let millis = entropy.timestamp_millis();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| {
            let i = ((entropy.unit() * BASE36.len() as f64) as usize).min(BASE36.len() - 1);
            BASE36[i] as char
        })
        .collect();
    format!("node-{millis}-{suffix}")
}

pub fn synthesise_position(entropy: &mut dyn Entropy) -> Position {
    let x = X_MIN + entropy.unit() * X_SPAN;
    let y = Y_MIN + entropy.unit() * Y_SPAN;
    Position::new(x, y)
}

fn read_position(raw: &Value) -> Option<Position> {
    let x = raw.get("x")?.as_f64()?;
    let y = raw.get("y")?.as_f64()?;
    Some(Position::new(x, y))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededEntropy;
    use crate::models::{ACTION_COLOR, TRIGGER_COLOR};
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "action": "create_workflow",
            "nodes": [
                { "integration": "webhook", "name": "New lead", "type": "trigger" },
                {
                    "id": "crm",
                    "integration": "hubspot",
                    "name": "Create contact",
                    "type": "action",
                    "position": { "x": 640.0, "y": 220.0 },
                    "config": { "pipeline": "sales", "priority": 2, "notify": true }
                },
                { "integration": "slack", "name": "Ping team", "type": "action" }
            ],
            "connections": [
                { "source": "crm", "target": "x" },
                { "source": "crm" }
            ]
        })
    }

    /// Yields zeros long enough for the first two synthesised ids to collide.
    struct StuckEntropy {
        calls: usize,
    }

    impl Entropy for StuckEntropy {
        fn timestamp_millis(&mut self) -> i64 {
            42
        }
        fn unit(&mut self) -> f64 {
            self.calls += 1;
            // The first two ids come out identical.
            if self.calls <= 18 { 0.0 } else { 0.5 }
        }
    }

    #[test]
    fn missing_nodes_is_a_no_op() {
        let mut entropy = SeededEntropy::new(0, 1);
        assert!(parse_ai_response(&json!({ "connections": [] }), &mut entropy).is_none());
        assert!(parse_ai_response(&json!({ "nodes": "three" }), &mut entropy).is_none());
        assert!(parse_ai_response(&json!(null), &mut entropy).is_none());
    }

    #[test]
    fn identical_seeds_give_identical_graphs() {
        let response = sample_response();
        let a = parse_ai_response(&response, &mut SeededEntropy::new(1_700_000_000_000, 9)).unwrap();
        let b = parse_ai_response(&response, &mut SeededEntropy::new(1_700_000_000_000, 9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn synthesised_positions_stay_in_the_viewport() {
        let nodes: Vec<Value> = (0..200)
            .map(|i| json!({ "integration": "gmail", "name": format!("mail {i}") }))
            .collect();
        let response = json!({ "nodes": nodes });

        let graph = parse_ai_response(&response, &mut SeededEntropy::new(0, 3)).unwrap();
        for node in &graph.nodes {
            assert!((100.0..500.0).contains(&node.position.x), "x = {}", node.position.x);
            assert!((100.0..400.0).contains(&node.position.y), "y = {}", node.position.y);
        }
    }

    #[test]
    fn edge_ids_follow_connection_index() {
        let connections: Vec<Value> = (0..5).map(|i| json!({ "source": format!("s{i}"), "target": "t" })).collect();
        let response = json!({ "nodes": [], "connections": connections });

        let graph = parse_ai_response(&response, &mut SeededEntropy::new(0, 0)).unwrap();
        for (i, edge) in graph.edges.iter().enumerate() {
            assert_eq!(edge.id, format!("edge-{i}"));
            assert_eq!(edge.source.as_deref(), Some(format!("s{i}").as_str()));
            assert!(edge.animated);
        }
    }

    #[test]
    fn provided_fields_pass_through() {
        let graph = parse_ai_response(&sample_response(), &mut SeededEntropy::new(5, 5)).unwrap();
        let crm = &graph.nodes[1];

        assert_eq!(crm.id, "crm");
        assert_eq!(crm.position, Position::new(640.0, 220.0));
        assert_eq!(crm.data.config["pipeline"], "sales");
        assert_eq!(crm.data.config["priority"], 2);
        assert_eq!(crm.data.config["notify"], true);
        assert_eq!(crm.data.label, "Create contact");
        assert!(!crm.data.is_configured);
    }

    #[test]
    fn palette_follows_trigger_or_action() {
        let graph = parse_ai_response(&sample_response(), &mut SeededEntropy::new(5, 5)).unwrap();
        assert_eq!(graph.nodes[0].data.integration.color, TRIGGER_COLOR);
        assert_eq!(graph.nodes[0].data.integration.kind, StepKind::Trigger);
        assert_eq!(graph.nodes[2].data.integration.color, ACTION_COLOR);
    }

    #[test]
    fn synthesised_ids_have_the_expected_shape() {
        let graph = parse_ai_response(&sample_response(), &mut SeededEntropy::new(1_234, 5)).unwrap();
        let id = &graph.nodes[0].id;
        let suffix = id.strip_prefix("node-1234-").expect("timestamped prefix");
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn malformed_connections_keep_absent_endpoints() {
        let graph = parse_ai_response(&sample_response(), &mut SeededEntropy::new(0, 0)).unwrap();
        assert_eq!(graph.edges[1].source.as_deref(), Some("crm"));
        assert_eq!(graph.edges[1].target, None);
        // Dangling target is carried as-is.
        assert_eq!(graph.edges[0].target.as_deref(), Some("x"));
    }

    #[test]
    fn colliding_synthesised_ids_are_redrawn() {
        let response = json!({ "nodes": [
            { "integration": "gmail", "position": { "x": 1, "y": 1 } },
            { "integration": "gmail", "position": { "x": 1, "y": 1 } }
        ]});

        let graph = parse_ai_response(&response, &mut StuckEntropy { calls: 0 }).unwrap();
        assert_ne!(graph.nodes[0].id, graph.nodes[1].id);
    }

    #[test]
    fn integration_may_be_an_object() {
        let response = json!({ "nodes": [{ "integration": { "id": "stripe" }, "type": "action" }] });
        let graph = parse_ai_response(&response, &mut SeededEntropy::new(0, 0)).unwrap();

        assert_eq!(graph.nodes[0].data.integration.id, "stripe");
        // Name falls back to the integration id.
        assert_eq!(graph.nodes[0].data.label, "stripe");
    }
}
