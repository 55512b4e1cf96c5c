//! Read-only projections of a [`TopologyResult`] for tables and highlighting.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::types::{BarrierCost, Edge, EdgeState, Node, TopologyResult};

/// Which edges a view highlights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorScope {
    All,
    MinPath,
    Spof,
    ActiveFlow,
    SelectedBarrier(String),
}

impl fmt::Display for InspectorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectorScope::All => f.write_str("all"),
            InspectorScope::MinPath => f.write_str("min_path"),
            InspectorScope::Spof => f.write_str("spof"),
            InspectorScope::ActiveFlow => f.write_str("active_flow"),
            InspectorScope::SelectedBarrier(id) => write!(f, "selected_barrier:{id}"),
        }
    }
}

impl FromStr for InspectorScope {
    type Err = String;

    /// `all`, `min_path`, `spof`, `active_flow` or `selected_barrier:<element id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(InspectorScope::All),
            "min_path" => Ok(InspectorScope::MinPath),
            "spof" => Ok(InspectorScope::Spof),
            "active_flow" => Ok(InspectorScope::ActiveFlow),
            other => match other.strip_prefix("selected_barrier:") {
                Some(id) if !id.is_empty() => Ok(InspectorScope::SelectedBarrier(id.to_string())),
                _ => Err(format!(
                    "unknown scope '{other}' (expected all, min_path, spof, active_flow or selected_barrier:<id>)"
                )),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRow {
    pub node_id: String,
    pub kind: String,
    pub depth_top: Option<f64>,
    pub depth_bottom: Option<f64>,
    pub is_blocked: bool,
    pub is_active_flow: bool,
    pub is_on_min_path: bool,
    pub in_scope: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRow {
    pub edge_id: String,
    pub kind: String,
    pub from: String,
    pub to: String,
    pub cost: Option<BarrierCost>,
    pub state: EdgeState,
    pub rule_id: String,
    pub summary: String,
    pub is_on_min_path: bool,
    pub is_spof: bool,
    pub is_active_flow: bool,
    pub in_scope: bool,
}

pub struct TopologyInspector<'r> {
    result: &'r TopologyResult,
    min_path: BTreeSet<&'r str>,
    spof: BTreeSet<&'r str>,
    active_nodes: BTreeSet<&'r str>,
}

impl<'r> TopologyInspector<'r> {
    pub fn new(result: &'r TopologyResult) -> Self {
        Self {
            result,
            min_path: result.min_cost_path_edge_ids.iter().map(String::as_str).collect(),
            spof: result.spof_edge_ids.iter().map(String::as_str).collect(),
            active_nodes: result.active_flow_node_ids.iter().map(String::as_str).collect(),
        }
    }

    /// Open edges whose both ends carry active flow.
    fn is_active_flow_edge(&self, edge: &Edge) -> bool {
        edge.cost == Some(BarrierCost::Open)
            && self.active_nodes.contains(edge.from.as_str())
            && self.active_nodes.contains(edge.to.as_str())
    }

    /// Edge ids in scope, restricted to edges that exist in the result.
    pub fn scope_edge_ids(&self, scope: &InspectorScope) -> BTreeSet<&'r str> {
        let edges = &self.result.edges;
        match scope {
            InspectorScope::All => edges.iter().map(|e| e.edge_id.as_str()).collect(),
            InspectorScope::MinPath => self.known(&self.min_path),
            InspectorScope::Spof => self.known(&self.spof),
            InspectorScope::ActiveFlow => edges
                .iter()
                .filter(|e| self.is_active_flow_edge(e))
                .map(|e| e.edge_id.as_str())
                .collect(),
            InspectorScope::SelectedBarrier(element_id) => self
                .result
                .barrier_envelope
                .element(element_id)
                .map(|el| {
                    el.edge_ids
                        .iter()
                        .filter_map(|id| self.edge(id))
                        .map(|e| e.edge_id.as_str())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn edge(&self, edge_id: &str) -> Option<&'r Edge> {
        self.result.edges.iter().find(|e| e.edge_id == edge_id)
    }

    fn known(&self, ids: &BTreeSet<&'r str>) -> BTreeSet<&'r str> {
        ids.iter()
            .copied()
            .filter(|id| self.edge(id).is_some())
            .collect()
    }

    pub fn edge_rows(&self, scope: &InspectorScope) -> Vec<EdgeRow> {
        let in_scope = self.scope_edge_ids(scope);
        self.result
            .edges
            .iter()
            .map(|e| EdgeRow {
                edge_id: e.edge_id.clone(),
                kind: e.kind.as_str().to_string(),
                from: e.from.clone(),
                to: e.to.clone(),
                cost: e.cost,
                state: e.state,
                rule_id: e.reason.rule_id.clone(),
                summary: e.reason.summary.clone(),
                is_on_min_path: self.min_path.contains(e.edge_id.as_str()),
                is_spof: self.spof.contains(e.edge_id.as_str()),
                is_active_flow: self.is_active_flow_edge(e),
                in_scope: in_scope.contains(e.edge_id.as_str()),
            })
            .collect()
    }

    /// A node is in scope when any in-scope edge touches it.
    pub fn node_rows(&self, scope: &InspectorScope) -> Vec<NodeRow> {
        let in_scope = self.scope_edge_ids(scope);
        let mut scoped_nodes: BTreeSet<&str> = BTreeSet::new();
        let mut path_nodes: BTreeSet<&str> = BTreeSet::new();
        for e in &self.result.edges {
            if in_scope.contains(e.edge_id.as_str()) {
                scoped_nodes.extend([e.from.as_str(), e.to.as_str()]);
            }
            if self.min_path.contains(e.edge_id.as_str()) {
                path_nodes.extend([e.from.as_str(), e.to.as_str()]);
            }
        }

        self.result
            .nodes
            .iter()
            .map(|n: &Node| NodeRow {
                node_id: n.node_id.clone(),
                kind: n.kind.as_str().to_string(),
                depth_top: n.depth_top,
                depth_bottom: n.depth_bottom,
                is_blocked: n.meta.is_blocked,
                is_active_flow: self.active_nodes.contains(n.node_id.as_str()),
                is_on_min_path: path_nodes.contains(n.node_id.as_str()),
                in_scope: scoped_nodes.contains(n.node_id.as_str()),
            })
            .collect()
    }
}
