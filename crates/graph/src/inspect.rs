//! Canvas diagnostics.
//!
//! Nothing here rejects a graph: canvases with duplicate ids, dangling
//! edges or cycles are saved as they are.  The report only tells a user or
//! operator what looks off.
//!
//! Checks:
//! 1. Node ids that appear more than once.
//! 2. Edges whose `source`/`target` is missing or names no node.
//! 3. Cycles among the well-formed edges (Kahn's algorithm); when there are
//!    none, a topological order of the node ids is reported.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::models::{WorkflowEdge, WorkflowNode};

/// Which end of an edge is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeEnd {
    Source,
    Target,
}

/// An edge endpoint that does not resolve to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingEdge {
    pub edge_id: String,
    pub end: EdgeEnd,
    /// `None` when the endpoint is missing altogether.
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphReport {
    pub duplicate_node_ids: Vec<String>,
    pub dangling_edges: Vec<DanglingEdge>,
    pub has_cycle: bool,
    /// Node ids in dependency order; empty when the graph is cyclic.
    pub order: Vec<String>,
}

impl GraphReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_node_ids.is_empty() && self.dangling_edges.is_empty() && !self.has_cycle
    }
}

pub fn inspect(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> GraphReport {
    let mut report = GraphReport::default();

    // -----------------------------------------------------------------------
    // 1. Duplicate node ids
    // -----------------------------------------------------------------------
    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) && !report.duplicate_node_ids.contains(&node.id) {
            report.duplicate_node_ids.push(node.id.clone());
        }
    }

    // -----------------------------------------------------------------------
    // 2. Dangling endpoints
    // -----------------------------------------------------------------------
    let mut links: Vec<(&str, &str)> = Vec::with_capacity(edges.len());
    for edge in edges {
        let source = check_end(edge, EdgeEnd::Source, edge.source.as_deref(), &seen, &mut report);
        let target = check_end(edge, EdgeEnd::Target, edge.target.as_deref(), &seen, &mut report);
        if let (Some(s), Some(t)) = (source, target) {
            links.push((s, t));
        }
    }

    // -----------------------------------------------------------------------
    // 3. Topological sort (Kahn's algorithm) over well-formed edges
    // -----------------------------------------------------------------------
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut unique_ids: Vec<&str> = Vec::with_capacity(seen.len());

    for node in nodes {
        if !in_degree.contains_key(node.id.as_str()) {
            unique_ids.push(node.id.as_str());
        }
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }
    for (from, to) in links {
        adjacency.entry(from).or_default().push(to);
        *in_degree.entry(to).or_insert(0) += 1;
    }

    // Seed in canvas order so the result is stable.
    let mut queue: VecDeque<&str> = unique_ids
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(unique_ids.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_owned());
        if let Some(next) = adjacency.get(id) {
            for &neighbour in next {
                let degree = in_degree.entry(neighbour).or_insert(0);
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    if order.len() == unique_ids.len() {
        report.order = order;
    } else {
        report.has_cycle = true;
    }

    report
}

fn check_end<'a>(
    edge: &WorkflowEdge,
    end: EdgeEnd,
    node_id: Option<&'a str>,
    known: &HashSet<&str>,
    report: &mut GraphReport,
) -> Option<&'a str> {
    match node_id {
        Some(id) if known.contains(id) => Some(id),
        other => {
            report.dangling_edges.push(DanglingEdge {
                edge_id: edge.id.clone(),
                end,
                node_id: other.map(str::to_owned),
            });
            None
        }
    }
}
