//! Path algorithms over the barrier graph.
//!
//! Both searches are multi-source and run over an adjacency list built in
//! edge order, so equal inputs always give equal outputs:
//!
//! - **Active flow**: plain BFS over cost-0 edges. A node is active when flow
//!   can reach it without any barrier failing.
//! - **Minimum failure**: 0-1 BFS over cost-0 and cost-1 edges. Cost-0 arcs
//!   go to the front of the deque, cost-1 arcs to the back; a node's
//!   predecessor is only replaced by a strictly cheaper route, so the first
//!   equal-cost relaxation wins.
//!
//! Termination edges are forward-only (flow leaves through the wellhead, it
//! never comes back in); every other edge is bidirectional. Impassable edges
//! are never traversed.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::TopologyError;
use crate::types::{BarrierCost, Edge, EdgeKind, Node, SURFACE_NODE_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    /// `from → to` only
    Forward,
    Bidirectional,
}

/// Which edges a search may use and how.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalPolicy {
    pub allow_costs: BTreeSet<BarrierCost>,
    pub default_edge_direction: EdgeDirection,
    pub edge_directions_by_kind: HashMap<EdgeKind, EdgeDirection>,
    /// Reached but never expanded
    pub sink_node_ids: HashSet<String>,
}

impl TraversalPolicy {
    /// Cost-0 edges only, stopping at SURFACE.
    pub fn active_flow() -> Self {
        Self {
            allow_costs: BTreeSet::from([BarrierCost::Open]),
            default_edge_direction: EdgeDirection::Bidirectional,
            edge_directions_by_kind: HashMap::from([(EdgeKind::Termination, EdgeDirection::Forward)]),
            sink_node_ids: HashSet::from([SURFACE_NODE_ID.to_string()]),
        }
    }

    /// Cost-0 and cost-1 edges, no sinks.
    pub fn minimum_failure() -> Self {
        Self {
            allow_costs: BTreeSet::from([BarrierCost::Open, BarrierCost::Barrier]),
            sink_node_ids: HashSet::new(),
            ..Self::active_flow()
        }
    }

    fn direction(&self, kind: EdgeKind) -> EdgeDirection {
        self.edge_directions_by_kind
            .get(&kind)
            .copied()
            .unwrap_or(self.default_edge_direction)
    }
}

/// One traversable direction of an edge.
#[derive(Debug, Clone, Copy)]
struct Step<'e> {
    to: &'e str,
    edge: &'e Edge,
    weight: u32,
}

type Adjacency<'e> = HashMap<&'e str, Vec<Step<'e>>>;

fn build_adjacency<'e>(
    edges: &'e [Edge],
    policy: &TraversalPolicy,
    excluded: &HashSet<String>,
) -> Adjacency<'e> {
    let mut adjacency: Adjacency<'e> = HashMap::new();
    for edge in edges {
        let Some(cost) = edge.cost else { continue };
        if !policy.allow_costs.contains(&cost) || excluded.contains(&edge.edge_id) {
            continue;
        }
        let weight = cost.weight();
        adjacency.entry(edge.from.as_str()).or_default().push(Step {
            to: edge.to.as_str(),
            edge,
            weight,
        });
        if policy.direction(edge.kind) == EdgeDirection::Bidirectional {
            adjacency.entry(edge.to.as_str()).or_default().push(Step {
                to: edge.from.as_str(),
                edge,
                weight,
            });
        }
    }
    adjacency
}

fn dedup_sources<'s>(source_node_ids: &[&'s str]) -> Vec<&'s str> {
    let mut seen = HashSet::new();
    source_node_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

// ============================================================================
// Active flow
// ============================================================================

/// Nodes reachable from any source over open edges, sorted and deduplicated.
/// Includes the sources themselves and SURFACE when it is reached.
pub fn compute_active_flow_node_ids(source_node_ids: &[&str], edges: &[Edge]) -> Vec<String> {
    let policy = TraversalPolicy::active_flow();
    let adjacency = build_adjacency(edges, &policy, &HashSet::new());

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for id in dedup_sources(source_node_ids) {
        if visited.insert(id) {
            queue.push_back(id);
        }
    }

    while let Some(node) = queue.pop_front() {
        if policy.sink_node_ids.contains(node) {
            continue;
        }
        for arc in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
            if visited.insert(arc.to) {
                queue.push_back(arc.to);
            }
        }
    }

    let mut ids: Vec<String> = visited.into_iter().map(str::to_string).collect();
    ids.sort();
    ids
}

// ============================================================================
// Minimum failure
// ============================================================================

/// Cheapest route from any source to the target.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinimumFailurePath {
    /// Number of barriers that must fail; `None` when unreachable or sourceless
    pub min_failure_cost_to_surface: Option<u32>,
    /// Source to target, in traversal order
    pub min_cost_path_edge_ids: Vec<String>,
}

/// 0-1 BFS from all sources to `target_node_id`, skipping `excluded` edges.
///
/// The target must exist in `nodes`; anything else is a caller bug and
/// surfaces as [`TopologyError::MissingTargetNode`].
pub fn compute_minimum_failure_path(
    source_node_ids: &[&str],
    target_node_id: &str,
    nodes: &[Node],
    edges: &[Edge],
    excluded: &HashSet<String>,
) -> Result<MinimumFailurePath, TopologyError> {
    if !nodes.iter().any(|n| n.node_id == target_node_id) {
        return Err(TopologyError::MissingTargetNode(target_node_id.to_string()));
    }
    let sources = dedup_sources(source_node_ids);
    if sources.is_empty() {
        return Ok(MinimumFailurePath::default());
    }

    let policy = TraversalPolicy::minimum_failure();
    let adjacency = build_adjacency(edges, &policy, excluded);

    let mut dist: HashMap<&str, u32> = HashMap::new();
    let mut via: HashMap<&str, (&str, &str)> = HashMap::new();
    let mut deque: VecDeque<(&str, u32)> = VecDeque::new();
    for id in sources {
        dist.insert(id, 0);
        deque.push_back((id, 0));
    }

    while let Some((node, d)) = deque.pop_front() {
        if dist.get(node).is_some_and(|&best| d > best) {
            continue;
        }
        if policy.sink_node_ids.contains(node) {
            continue;
        }
        for arc in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
            let next = d + arc.weight;
            if dist.get(arc.to).map_or(true, |&best| next < best) {
                dist.insert(arc.to, next);
                via.insert(arc.to, (node, arc.edge.edge_id.as_str()));
                if arc.weight == 0 {
                    deque.push_front((arc.to, next));
                } else {
                    deque.push_back((arc.to, next));
                }
            }
        }
    }

    let Some(&cost) = dist.get(target_node_id) else {
        return Ok(MinimumFailurePath::default());
    };

    let mut path = Vec::new();
    let mut cursor = target_node_id;
    while let Some(&(prev, edge_id)) = via.get(cursor) {
        path.push(edge_id.to_string());
        cursor = prev;
    }
    path.reverse();

    Ok(MinimumFailurePath {
        min_failure_cost_to_surface: Some(cost),
        min_cost_path_edge_ids: path,
    })
}

// ============================================================================
// Single points of failure
// ============================================================================

/// Cost-1 edges on the cheapest path when exactly one barrier stands between
/// source and surface; empty otherwise.
pub fn compute_spof_edge_ids(
    min_failure_cost: Option<u32>,
    min_cost_path_edge_ids: &[String],
    edge_by_id: &HashMap<&str, &Edge>,
) -> Vec<String> {
    if min_failure_cost != Some(1) {
        return Vec::new();
    }
    min_cost_path_edge_ids
        .iter()
        .filter(|id| {
            edge_by_id
                .get(id.as_str())
                .is_some_and(|e| e.cost == Some(BarrierCost::Barrier))
        })
        .cloned()
        .collect()
}
