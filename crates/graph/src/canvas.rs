//! The editable canvas and the AI generation merge.
//!
//! A generation is a full overwrite: the previous nodes and edges are
//! discarded and replaced by the parser output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::entropy::Entropy;
use crate::models::{WorkflowEdge, WorkflowNode};
use crate::parser::parse_ai_response;

/// The only `action` value a generation is applied for.
pub const GENERATE_ACTION: &str = "create_workflow";

/// Current canvas contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

/// Counts reported back to the user after a generation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub node_count: usize,
    pub edge_count: usize,
}

impl Canvas {
    pub fn new(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Replace the canvas with the graph in `response`.
    ///
    /// Returns `None` (canvas untouched) when the response carries a
    /// different `action`, or has no node list.
    pub fn apply_generation(&mut self, response: &Value, entropy: &mut dyn Entropy) -> Option<GenerationSummary> {
        match response.get("action") {
            None | Some(Value::Null) => {}
            Some(Value::String(action)) if action == GENERATE_ACTION => {}
            Some(other) => {
                debug!("ignoring AI response with action {}", other);
                return None;
            }
        }

        let parsed = parse_ai_response(response, entropy)?;
        let summary = GenerationSummary {
            node_count: parsed.nodes.len(),
            edge_count: parsed.edges.len(),
        };

        self.nodes = parsed.nodes;
        self.edges = parsed.edges;

        info!(
            "canvas replaced by generation ({} nodes, {} edges)",
            summary.node_count, summary.edge_count
        );
        Some(summary)
    }
}
