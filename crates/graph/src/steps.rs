//! Canvas nodes ⇄ the flat `steps` array stored on a workflow row.
//!
//! The stored shape has no place for edges, so [`to_steps`] drops them and
//! [`from_steps`] can only ever rebuild nodes.

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::models::{
    IconKind, IntegrationRef, NodeConfig, NodeData, NodeType, Position, StepKind, WorkflowNode,
};

/// One persisted workflow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub name: String,
    #[serde(default)]
    pub config: NodeConfig,
    pub position: Position,
    pub order: usize,
}

/// Flatten nodes into steps, numbering them by array position.
pub fn to_steps(nodes: &[WorkflowNode]) -> Vec<Step> {
    nodes
        .iter()
        .enumerate()
        .map(|(order, node)| Step {
            id: node.id.clone(),
            kind: node.data.integration.kind,
            name: node.data.integration.name.clone(),
            config: node.data.config.clone(),
            position: node.position,
            order,
        })
        .collect()
}

/// Rebuild canvas nodes from stored steps, in `order`.
///
/// The integration id is not stored, so it is recovered from the catalog by
/// display name, falling back to a slug of the name.
pub fn from_steps(steps: &[Step]) -> Vec<WorkflowNode> {
    let mut ordered: Vec<&Step> = steps.iter().collect();
    ordered.sort_by_key(|s| s.order);

    ordered
        .into_iter()
        .map(|step| {
            let (integration_id, icon) = match catalog::find_by_name(&step.name) {
                Some(entry) => (entry.id.to_owned(), entry.icon),
                None => (slug(&step.name), IconKind::Generic),
            };

            let mut integration = IntegrationRef::unresolved(integration_id, step.name.clone(), step.kind);
            integration.icon = icon;

            WorkflowNode {
                id: step.id.clone(),
                node_type: NodeType::IntegrationNode,
                position: step.position,
                data: NodeData {
                    integration,
                    config: step.config.clone(),
                    label: step.name.clone(),
                    is_configured: false,
                },
            }
        })
        .collect()
}

fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
