//! Barrier envelope evaluator.
//!
//! Compares the cheapest failure route (primary) with the cheapest route that
//! shares none of its edges (secondary). Each route's cost-1 edges are mapped
//! back to the physical rows holding them, and the overlap between the two
//! element sets gives a rough independence rating.
//!
//! This is a screening heuristic. Two routes with distinct elements do not
//! prove the well has two independent barrier envelopes; a min-cut would.

use std::collections::{HashMap, HashSet};

use super::TopologyError;
use super::paths::{MinimumFailurePath, compute_minimum_failure_path};
use crate::types::{
    BarrierCost, BarrierElement, BarrierEnvelope, Edge, EnvelopeOverlap, EnvelopePath,
    IndependenceHeuristic, Node, barrier_element_id,
};

/// Function key of the element synthesized for a cost-1 edge that has no
/// holding contributor.
pub const EDGE_FALLBACK_FUNCTION: &str = "edge";

/// Deduplicated barrier elements on a path, in first-seen order.
pub fn barrier_elements_for_path(
    path_edge_ids: &[String],
    edge_by_id: &HashMap<&str, &Edge>,
) -> Vec<BarrierElement> {
    let mut elements: Vec<BarrierElement> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut add = |row_id: &str, function_key: &str, equipment_type: Option<&str>, edge_id: &str| {
        let element_id = barrier_element_id(row_id, function_key);
        let slot = *index.entry(element_id.clone()).or_insert_with(|| {
            elements.push(BarrierElement {
                element_id,
                row_id: row_id.to_string(),
                function_key: function_key.to_string(),
                equipment_types: Vec::new(),
                edge_ids: Vec::new(),
            });
            elements.len() - 1
        });
        let element = &mut elements[slot];
        if let Some(t) = equipment_type {
            if !element.equipment_types.iter().any(|e| e == t) {
                element.equipment_types.push(t.to_string());
            }
        }
        if !element.edge_ids.iter().any(|e| e == edge_id) {
            element.edge_ids.push(edge_id.to_string());
        }
    };

    for edge_id in path_edge_ids {
        let Some(edge) = edge_by_id.get(edge_id.as_str()) else {
            continue;
        };
        if edge.cost != Some(BarrierCost::Barrier) {
            continue;
        }
        let holding: Vec<_> = edge
            .reason
            .details
            .equipment_contributors
            .iter()
            .filter(|c| c.cost == Some(BarrierCost::Barrier))
            .collect();
        if holding.is_empty() {
            add(edge_id, EDGE_FALLBACK_FUNCTION, None, edge_id);
        }
        for c in holding {
            add(&c.row_id, &c.function_key, Some(c.equipment_type.as_str()), edge_id);
        }
    }

    elements
}

fn envelope_path(path: &MinimumFailurePath, edge_by_id: &HashMap<&str, &Edge>) -> EnvelopePath {
    let elements = barrier_elements_for_path(&path.min_cost_path_edge_ids, edge_by_id);
    EnvelopePath {
        cost: path.min_failure_cost_to_surface,
        path_edge_ids: path.min_cost_path_edge_ids.clone(),
        element_ids: elements.iter().map(|e| e.element_id.clone()).collect(),
        element_count: elements.len(),
        elements,
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    let r = numerator as f64 / denominator as f64;
    Some((r * 1000.0).round() / 1000.0)
}

fn overlap(primary: &EnvelopePath, secondary: &EnvelopePath) -> EnvelopeOverlap {
    let secondary_ids: HashSet<&str> = secondary.element_ids.iter().map(String::as_str).collect();
    let element_ids: Vec<String> = primary
        .element_ids
        .iter()
        .filter(|id| secondary_ids.contains(id.as_str()))
        .cloned()
        .collect();
    let count = element_ids.len();
    EnvelopeOverlap {
        element_ids,
        element_count: count,
        ratio_to_primary: ratio(count, primary.element_count),
        ratio_to_secondary: ratio(count, secondary.element_count),
    }
}

pub fn classify(
    primary: &EnvelopePath,
    secondary: &EnvelopePath,
    overlap: &EnvelopeOverlap,
) -> IndependenceHeuristic {
    if primary.element_count == 0 {
        IndependenceHeuristic::NoBarrierElements
    } else if secondary.cost.is_none() {
        IndependenceHeuristic::SinglePathOnly
    } else if overlap.element_count == 0 {
        IndependenceHeuristic::DistinctEnvelopes
    } else if overlap.element_count >= primary.element_count.min(secondary.element_count) {
        IndependenceHeuristic::FullySharedEnvelopes
    } else {
        IndependenceHeuristic::PartialOverlapEnvelopes
    }
}

/// Build both envelopes around an already computed primary path.
pub fn evaluate_barrier_envelope(
    source_node_ids: &[&str],
    target_node_id: &str,
    nodes: &[Node],
    edges: &[Edge],
    primary_path: &MinimumFailurePath,
    edge_by_id: &HashMap<&str, &Edge>,
) -> Result<BarrierEnvelope, TopologyError> {
    let primary = envelope_path(primary_path, edge_by_id);

    let secondary = if primary.cost.is_some() {
        let excluded: HashSet<String> = primary.path_edge_ids.iter().cloned().collect();
        let path = compute_minimum_failure_path(
            source_node_ids,
            target_node_id,
            nodes,
            edges,
            &excluded,
        )?;
        envelope_path(&path, edge_by_id)
    } else {
        EnvelopePath::default()
    };

    let overlap = overlap(&primary, &secondary);
    let independence_heuristic = classify(&primary, &secondary, &overlap);

    Ok(BarrierEnvelope {
        primary,
        secondary,
        overlap,
        independence_heuristic,
    })
}
