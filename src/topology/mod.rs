//! Topology model: snapshot in, immutable [`TopologyResult`] out.
//!
//! ## Stages
//!
//! 1. Normalize intervals (sort, drop invalid and overlapping ones)
//! 2. [`nodes`]: volume nodes per interval
//! 3. [`edges`]: vertical, radial, scenario and termination edges
//! 4. [`sources`]: effective source set under tier precedence
//! 5. [`paths`]: active flow, minimum failure path, single points of failure
//! 6. [`envelope`]: primary/secondary barrier envelope comparison
//!
//! [`build_topology_model`] is pure: equal inputs give structurally equal
//! results, and nothing is cached between calls.

pub mod edges;
pub mod envelope;
pub mod inspector;
pub mod nodes;
pub mod paths;
pub mod sources;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::TopologyConfig;
use crate::types::{
    Edge, IntervalStack, SURFACE_NODE_ID, TopologyResult, ValidationWarning, WarningCode,
    WellSnapshot,
};

pub use inspector::{InspectorScope, TopologyInspector};

/// Programmer errors. Input defects never land here; they become
/// validation warnings on the result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("request id must be positive")]
    InvalidRequestId,

    #[error("target node {0} is not in the node set")]
    MissingTargetNode(String),
}

/// Identity of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub request_id: u64,
    pub well_id: String,
}

impl BuildRequest {
    pub fn new(request_id: u64, well_id: impl Into<String>) -> Self {
        Self {
            request_id,
            well_id: well_id.into(),
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Sort intervals by top and drop the ones the builders cannot use.
pub fn normalize_intervals(
    intervals: &[IntervalStack],
    tolerance: f64,
) -> (Vec<IntervalStack>, Vec<ValidationWarning>) {
    let mut warnings = Vec::new();
    let mut sorted: Vec<&IntervalStack> = Vec::with_capacity(intervals.len());

    for stack in intervals {
        if stack.interval.is_valid() {
            sorted.push(stack);
        } else {
            warnings.push(
                ValidationWarning::new(
                    WarningCode::InvalidInterval,
                    format!(
                        "Interval {}-{} is empty or not finite",
                        stack.interval.top, stack.interval.bottom
                    ),
                )
                .with_fields(&["top", "bottom"]),
            );
        }
    }
    sorted.sort_by(|a, b| a.interval.top.total_cmp(&b.interval.top));

    let mut kept: Vec<IntervalStack> = Vec::with_capacity(sorted.len());
    for stack in sorted {
        if let Some(prev) = kept.last() {
            if stack.interval.top < prev.interval.bottom - tolerance {
                warnings.push(
                    ValidationWarning::new(
                        WarningCode::OverlappingInterval,
                        format!(
                            "Interval {}-{} overlaps {}-{}",
                            stack.interval.top,
                            stack.interval.bottom,
                            prev.interval.top,
                            prev.interval.bottom
                        ),
                    )
                    .with_fields(&["top", "bottom"]),
                );
                continue;
            }
        }
        kept.push(stack.clone());
    }

    (kept, warnings)
}

// ============================================================================
// Orchestration
// ============================================================================

/// Build the complete topology result for one snapshot.
pub fn build_topology_model(
    snapshot: &WellSnapshot,
    request: &BuildRequest,
    config: &TopologyConfig,
) -> Result<TopologyResult, TopologyError> {
    if request.request_id == 0 {
        return Err(TopologyError::InvalidRequestId);
    }
    let tolerance = config.edges.depth_tolerance;

    let (stacks, mut warnings) = normalize_intervals(&snapshot.intervals, tolerance);
    let graph = nodes::build_nodes(&stacks, &config.nodes);
    debug!(
        intervals = stacks.len(),
        nodes = graph.nodes.len(),
        "Nodes built"
    );

    let (rows, row_warnings) = edges::BarrierRows::index(snapshot, &stacks);
    warnings.extend(row_warnings);
    let ctx = edges::EdgeContext {
        graph: &graph,
        stacks: &stacks,
        rows: &rows,
        config: &config.edges,
    };
    let edge_output = edges::build_all_edges(ctx, &snapshot.breakouts);
    warnings.extend(edge_output.validation_warnings);

    let candidates =
        sources::SourceCandidates::collect(&graph, snapshot, &config.sources, tolerance);
    let resolved = sources::resolve_sources(
        candidates,
        snapshot.illustrative_fluid_sources,
        snapshot.has_scenario_rows(),
    );
    let source_ids = resolved.node_ids();

    let all_edges = edge_output.edges;
    let edge_by_id: HashMap<&str, &Edge> =
        all_edges.iter().map(|e| (e.edge_id.as_str(), e)).collect();

    let active_flow_node_ids = paths::compute_active_flow_node_ids(&source_ids, &all_edges);
    let primary = paths::compute_minimum_failure_path(
        &source_ids,
        SURFACE_NODE_ID,
        &graph.nodes,
        &all_edges,
        &Default::default(),
    )?;
    let spof_edge_ids = paths::compute_spof_edge_ids(
        primary.min_failure_cost_to_surface,
        &primary.min_cost_path_edge_ids,
        &edge_by_id,
    );
    let barrier_envelope = envelope::evaluate_barrier_envelope(
        &source_ids,
        SURFACE_NODE_ID,
        &graph.nodes,
        &all_edges,
        &primary,
        &edge_by_id,
    )?;

    warnings.extend(resolved.warnings);
    let source_entities = resolved.entities;

    let result = TopologyResult {
        request_id: request.request_id,
        well_id: request.well_id.clone(),
        nodes: graph.nodes,
        edges: all_edges,
        active_flow_node_ids,
        min_failure_cost_to_surface: primary.min_failure_cost_to_surface,
        min_cost_path_edge_ids: primary.min_cost_path_edge_ids,
        spof_edge_ids,
        barrier_envelope,
        source_entities,
        source_policy: resolved.policy,
        edge_reasons: edge_output.edge_reasons,
        validation_warnings: warnings,
    };

    let summary = result.summary();
    info!(
        request_id = summary.request_id,
        well_id = %summary.well_id,
        nodes = summary.node_count,
        edges = summary.edge_count,
        sources = summary.source_count,
        min_cost = ?summary.min_failure_cost_to_surface,
        spof = summary.spof_count,
        heuristic = summary.independence_heuristic.as_str(),
        warnings = summary.warning_count,
        "Topology model built"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DepthInterval;
    use super::fixtures::*;

    #[test]
    fn zero_request_id_is_rejected() {
        let err = build_topology_model(
            &intact_well(),
            &BuildRequest::new(0, "W"),
            &TopologyConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, TopologyError::InvalidRequestId);
    }

    #[test]
    fn normalization_sorts_and_drops_bad_intervals() {
        let layers = completion_layers();
        let mk = |top: f64, bottom: f64| IntervalStack {
            interval: DepthInterval::new(top, bottom),
            layers: layers.clone(),
        };
        let input = vec![mk(100.0, 200.0), mk(0.0, 100.0), mk(50.0, 50.0), mk(150.0, 250.0)];
        let (kept, warnings) = normalize_intervals(&input, 1e-6);
        let tops: Vec<f64> = kept.iter().map(|s| s.interval.top).collect();
        assert_eq!(tops, vec![0.0, 100.0]);
        let codes: Vec<WarningCode> = warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![WarningCode::InvalidInterval, WarningCode::OverlappingInterval]
        );
    }

    #[test]
    fn casing_is_the_single_barrier_above_open_hole() {
        let result = build_topology_model(
            &intact_well(),
            &BuildRequest::new(1, "W-1"),
            &TopologyConfig::default(),
        )
        .unwrap();
        // Open hole → casing wall → annulus A → wellhead
        assert_eq!(result.min_failure_cost_to_surface, Some(1));
        assert_eq!(
            result.spof_edge_ids,
            vec!["edge:radial:node:ANNULUS_A:2000:3000->node:FORMATION_ANNULUS:2000:3000"]
        );
        assert_eq!(result.edge_reasons.len(), result.edges.len());
        assert!(result.validation_warnings.is_empty());
    }

    #[test]
    fn empty_snapshot_is_well_defined() {
        let result = build_topology_model(
            &WellSnapshot::default(),
            &BuildRequest::new(3, "W-empty"),
            &TopologyConfig::default(),
        )
        .unwrap();
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
        assert!(result.active_flow_node_ids.is_empty());
        assert_eq!(result.min_failure_cost_to_surface, None);
        assert!(result.has_warning(WarningCode::NoSourcesResolved));
    }
}
