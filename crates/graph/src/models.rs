//! Canvas domain models.
//!
//! These types are the in-memory shape of a visual workflow: integration
//! nodes placed on a canvas and the edges drawn between them.  They
//! serialise to the camelCase JSON the canvas renderer consumes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fill colour for trigger integrations.
pub const TRIGGER_COLOR: &str = "#10B981";
/// Fill colour for action integrations.
pub const ACTION_COLOR: &str = "#3B82F6";
/// Stroke colour shared by every edge.
pub const EDGE_STROKE: &str = "#94A3B8";
/// Stroke width shared by every edge.
pub const EDGE_STROKE_WIDTH: u32 = 2;

/// Free-form node configuration (strings, numbers, booleans).
pub type NodeConfig = Map<String, Value>;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Canvas coordinates of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// StepKind
// ---------------------------------------------------------------------------

/// Whether an integration starts a workflow or acts within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Trigger,
    Action,
}

impl StepKind {
    /// Lenient parse used for AI output: only `"trigger"` is a trigger.
    pub fn from_loose(raw: Option<&str>) -> Self {
        match raw {
            Some("trigger") => Self::Trigger,
            _ => Self::Action,
        }
    }

    /// The palette colour for this kind.
    pub fn color(self) -> &'static str {
        match self {
            Self::Trigger => TRIGGER_COLOR,
            Self::Action => ACTION_COLOR,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trigger => write!(f, "trigger"),
            Self::Action => write!(f, "action"),
        }
    }
}

// ---------------------------------------------------------------------------
// IconKind
// ---------------------------------------------------------------------------

/// Icon tag for an integration.  The renderer maps each tag to artwork;
/// the graph model only ever carries the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    /// Not yet looked up in the catalog.
    Unresolved,
    Mail,
    Chat,
    Crm,
    Payment,
    Calendar,
    Spreadsheet,
    Database,
    Webhook,
    Schedule,
    Form,
    Generic,
}

// ---------------------------------------------------------------------------
// IntegrationRef
// ---------------------------------------------------------------------------

/// Reference from a node to an integration catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub color: String,
    pub icon: IconKind,
}

impl IntegrationRef {
    /// Build a reference whose colour follows its kind and whose icon is
    /// left for the catalog to resolve.
    pub fn unresolved(id: impl Into<String>, name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            color: kind.color().to_owned(),
            icon: IconKind::Unresolved,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowNode
// ---------------------------------------------------------------------------

/// The only node variant on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    #[serde(rename = "integrationNode")]
    IntegrationNode,
}

/// Payload rendered inside a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub integration: IntegrationRef,
    #[serde(default)]
    pub config: NodeConfig,
    pub label: String,
    #[serde(default)]
    pub is_configured: bool,
}

/// One workflow step bound to an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique within a workflow (see `parser` for how missing ids are made).
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    pub position: Position,
    pub data: NodeData,
}

// ---------------------------------------------------------------------------
// WorkflowEdge
// ---------------------------------------------------------------------------

/// The only edge variant on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeType {
    #[default]
    #[serde(rename = "smoothstep")]
    SmoothStep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: u32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke: EDGE_STROKE.to_owned(),
            stroke_width: EDGE_STROKE_WIDTH,
        }
    }
}

/// Directed visual connection between two nodes.
///
/// Endpoints are not checked against the node list; a connection the AI
/// emitted without a `source` or `target` keeps that side empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    #[serde(default = "animated_default")]
    pub animated: bool,
    #[serde(default)]
    pub style: EdgeStyle,
}

fn animated_default() -> bool {
    true
}

impl WorkflowEdge {
    /// Edge with the fixed cosmetic fields.
    pub fn new(id: impl Into<String>, source: Option<String>, target: Option<String>) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            edge_type: EdgeType::SmoothStep,
            animated: true,
            style: EdgeStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_serialises_with_canvas_field_names() {
        let node = WorkflowNode {
            id: "n1".into(),
            node_type: NodeType::IntegrationNode,
            position: Position::new(120.0, 140.0),
            data: NodeData {
                integration: IntegrationRef::unresolved("slack", "Slack", StepKind::Action),
                config: NodeConfig::new(),
                label: "Slack".into(),
                is_configured: false,
            },
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "integrationNode");
        assert_eq!(value["data"]["isConfigured"], false);
        assert_eq!(value["data"]["integration"]["type"], "action");
        assert_eq!(value["data"]["integration"]["color"], ACTION_COLOR);
        assert_eq!(value["data"]["integration"]["icon"], "unresolved");
    }

    #[test]
    fn edge_omits_missing_endpoints() {
        let edge = WorkflowEdge::new("edge-0", Some("a".into()), None);
        let value = serde_json::to_value(&edge).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "edge-0",
                "source": "a",
                "type": "smoothstep",
                "animated": true,
                "style": { "stroke": EDGE_STROKE, "strokeWidth": 2 }
            })
        );
    }

    #[test]
    fn only_trigger_is_a_trigger() {
        assert_eq!(StepKind::from_loose(Some("trigger")), StepKind::Trigger);
        assert_eq!(StepKind::from_loose(Some("Trigger")), StepKind::Action);
        assert_eq!(StepKind::from_loose(Some("action")), StepKind::Action);
        assert_eq!(StepKind::from_loose(Some("filter")), StepKind::Action);
        assert_eq!(StepKind::from_loose(None), StepKind::Action);
    }
}
