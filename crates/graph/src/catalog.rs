//! Static integration catalog.
//!
//! Generated nodes arrive with `IconKind::Unresolved`; call
//! [`resolve_icons`] before handing a canvas to a renderer.

use crate::models::{IconKind, StepKind, WorkflowNode};

/// One supported integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: StepKind,
    pub icon: IconKind,
}

const fn entry(id: &'static str, name: &'static str, kind: StepKind, icon: IconKind) -> CatalogEntry {
    CatalogEntry { id, name, kind, icon }
}

pub const CATALOG: &[CatalogEntry] = &[
    entry("webhook", "Webhook", StepKind::Trigger, IconKind::Webhook),
    entry("schedule", "Schedule", StepKind::Trigger, IconKind::Schedule),
    entry("form_submission", "Form Submission", StepKind::Trigger, IconKind::Form),
    entry("gmail", "Gmail", StepKind::Action, IconKind::Mail),
    entry("outlook", "Outlook", StepKind::Action, IconKind::Mail),
    entry("slack", "Slack", StepKind::Action, IconKind::Chat),
    entry("discord", "Discord", StepKind::Action, IconKind::Chat),
    entry("hubspot", "HubSpot", StepKind::Action, IconKind::Crm),
    entry("salesforce", "Salesforce", StepKind::Action, IconKind::Crm),
    entry("stripe", "Stripe", StepKind::Action, IconKind::Payment),
    entry("google_sheets", "Google Sheets", StepKind::Action, IconKind::Spreadsheet),
    entry("google_calendar", "Google Calendar", StepKind::Action, IconKind::Calendar),
    entry("airtable", "Airtable", StepKind::Action, IconKind::Database),
    entry("postgres", "PostgreSQL", StepKind::Action, IconKind::Database),
];

/// Exact lookup by integration id.
pub fn find(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.id == id)
}

/// Case-insensitive lookup by display name.
pub fn find_by_name(name: &str) -> Option<&'static CatalogEntry> {
    let name = name.trim();
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

/// Icon for an integration id; unknown ids get the generic icon.
pub fn icon_for(id: &str) -> IconKind {
    find(id).map_or(IconKind::Generic, |e| e.icon)
}

/// Replace every unresolved icon with the catalog's tag.
pub fn resolve_icons(nodes: &mut [WorkflowNode]) {
    for node in nodes.iter_mut() {
        let integration = &mut node.data.integration;
        if integration.icon == IconKind::Unresolved {
            integration.icon = icon_for(&integration.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IntegrationRef, NodeData, NodeType, Position};
    use std::collections::HashSet;

    fn node(integration: &str) -> WorkflowNode {
        WorkflowNode {
            id: format!("n-{integration}"),
            node_type: NodeType::IntegrationNode,
            position: Position::new(0.0, 0.0),
            data: NodeData {
                integration: IntegrationRef::unresolved(integration, integration, StepKind::Action),
                config: Default::default(),
                label: integration.into(),
                is_configured: false,
            },
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn resolve_icons_fills_known_and_unknown() {
        let mut nodes = vec![node("slack"), node("teleporter")];
        resolve_icons(&mut nodes);

        assert_eq!(nodes[0].data.integration.icon, IconKind::Chat);
        assert_eq!(nodes[1].data.integration.icon, IconKind::Generic);
    }

    #[test]
    fn resolved_icons_are_left_alone() {
        let mut nodes = vec![node("slack")];
        nodes[0].data.integration.icon = IconKind::Mail;
        resolve_icons(&mut nodes);
        assert_eq!(nodes[0].data.integration.icon, IconKind::Mail);
    }

    #[test]
    fn name_lookup_ignores_case() {
        assert_eq!(find_by_name("google sheets").map(|e| e.id), Some("google_sheets"));
        assert!(find_by_name("nope").is_none());
    }
}
