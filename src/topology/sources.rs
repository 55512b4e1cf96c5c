//! Source resolver: which nodes flow originates from.
//!
//! Candidates are gathered per tier, then one tier set wins:
//!
//! - **scenario**: any breakout row switches the model to explicit scenario
//!   mode; its `from` volumes become the only sources
//! - **marker**: perforation and leak markers, the engineering default
//! - **fluid**: hydrocarbon fluid columns, added to markers only when the
//!   snapshot opts into illustrative sources
//!
//! Scenario sources replace the other tiers outright, they are never merged.

use std::collections::HashSet;

use tracing::debug;

use super::nodes::NodeGraph;
use crate::config::SourceConfig;
use crate::types::{
    DepthRange, NodeKind, PolicyMode, SourceEntity, SourcePolicy, ValidationWarning, WarningCode,
    WellSnapshot,
};

/// Candidate sources per tier, before precedence is applied.
#[derive(Debug, Clone, Default)]
pub struct SourceCandidates {
    pub marker: Vec<SourceEntity>,
    pub fluid: Vec<SourceEntity>,
    pub scenario: Vec<SourceEntity>,
    pub warnings: Vec<ValidationWarning>,
}

/// The effective source set.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSources {
    pub entities: Vec<SourceEntity>,
    pub policy: SourcePolicy,
    pub warnings: Vec<ValidationWarning>,
}

impl ResolvedSources {
    pub fn node_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entities
            .iter()
            .map(|e| e.node_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Every node of `kind` whose interval overlaps `range`, shallowest first.
fn matching_nodes<'g>(
    graph: &'g NodeGraph,
    kind: NodeKind,
    range: &DepthRange,
    tolerance: f64,
) -> impl Iterator<Item = &'g str> + 'g {
    let range = *range;
    graph
        .intervals
        .iter()
        .enumerate()
        .filter(move |(_, iv)| range.overlaps(iv.top, iv.bottom, tolerance))
        .filter_map(move |(i, _)| graph.node_at(i, kind))
        .map(|n| n.node_id.as_str())
}

fn push_entities(
    into: &mut Vec<SourceEntity>,
    graph: &NodeGraph,
    kind: NodeKind,
    range: &DepthRange,
    tolerance: f64,
    row_id: &str,
    policy_mode: PolicyMode,
) -> usize {
    let before = into.len();
    for node_id in matching_nodes(graph, kind, range, tolerance) {
        let duplicate = into
            .iter()
            .any(|e| e.node_id == node_id && e.row_id == row_id);
        if !duplicate {
            into.push(SourceEntity {
                node_id: node_id.to_string(),
                kind,
                row_id: row_id.to_string(),
                policy_mode,
            });
        }
    }
    into.len() - before
}

impl SourceCandidates {
    /// Gather the tiers the snapshot can use. A declared scenario replaces
    /// markers and fluids, so those rows are not resolved (and not warned
    /// about) at all. Fluid rows are only considered when the snapshot opts
    /// into illustrative sources. Breakout rows are validated by the edge
    /// builder, so malformed ones are skipped here without a warning.
    pub fn collect(
        graph: &NodeGraph,
        snapshot: &WellSnapshot,
        config: &SourceConfig,
        tolerance: f64,
    ) -> Self {
        let mut c = Self::default();

        if snapshot.has_scenario_rows() {
            c.collect_scenario(graph, snapshot, tolerance);
            return c;
        }
        c.collect_markers(graph, snapshot, tolerance);
        if snapshot.illustrative_fluid_sources {
            c.collect_fluids(graph, snapshot, config, tolerance);
        }
        c
    }

    fn collect_markers(&mut self, graph: &NodeGraph, snapshot: &WellSnapshot, tolerance: f64) {
        for row in &snapshot.markers {
            let Some(range) = row.depth_range() else {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::MarkerMissingDepthRange,
                        &row.row_id,
                        "Marker has no usable depth range",
                    )
                    .with_fields(&["top", "bottom"]),
                );
                continue;
            };
            let Some(volume) = row.resolved_volume() else {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::MarkerMissingVolume,
                        &row.row_id,
                        "Leak marker does not name a volume",
                    )
                    .with_fields(&["volume"]),
                );
                continue;
            };
            let added = push_entities(
                &mut self.marker,
                graph,
                volume.node_kind(),
                &range,
                tolerance,
                &row.row_id,
                PolicyMode::MarkerDefault,
            );
            if added == 0 {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::MarkerNoResolvableInterval,
                        &row.row_id,
                        format!(
                            "No {} node between {:.1} and {:.1}",
                            volume.node_kind(),
                            range.top,
                            range.bottom
                        ),
                    )
                    .with_fields(&["top", "bottom", "volume"]),
                );
            }
        }
    }

    fn collect_fluids(
        &mut self,
        graph: &NodeGraph,
        snapshot: &WellSnapshot,
        config: &SourceConfig,
        tolerance: f64,
    ) {
        for row in snapshot
            .fluids
            .iter()
            .filter(|f| f.visible && config.is_hydrocarbon(&f.fluid))
        {
            let Some(range) = row.depth_range() else {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::FluidMissingDepthRange,
                        &row.row_id,
                        format!("{} column has no usable depth range", row.fluid),
                    )
                    .with_fields(&["top", "bottom"]),
                );
                continue;
            };
            let Some(volume) = row.volume else {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::FluidMissingVolume,
                        &row.row_id,
                        format!("{} column does not name a volume", row.fluid),
                    )
                    .with_fields(&["volume"]),
                );
                continue;
            };
            let added = push_entities(
                &mut self.fluid,
                graph,
                volume.node_kind(),
                &range,
                tolerance,
                &row.row_id,
                PolicyMode::FluidOptIn,
            );
            if added == 0 {
                self.warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::FluidNoResolvableInterval,
                        &row.row_id,
                        format!(
                            "No {} node between {:.1} and {:.1}",
                            volume.node_kind(),
                            range.top,
                            range.bottom
                        ),
                    )
                    .with_fields(&["top", "bottom", "volume"]),
                );
            }
        }
    }

    fn collect_scenario(&mut self, graph: &NodeGraph, snapshot: &WellSnapshot, tolerance: f64) {
        for row in &snapshot.breakouts {
            let (Some((from, _)), Some(range)) = (row.volume_pair(), row.depth_range()) else {
                continue;
            };
            push_entities(
                &mut self.scenario,
                graph,
                from.node_kind(),
                &range,
                tolerance,
                &row.row_id,
                PolicyMode::ScenarioExplicit,
            );
        }
    }
}

/// Apply tier precedence.
///
/// `has_scenario_rows` decides the mode, not whether scenario candidates
/// resolved: a snapshot with breakout rows that match no node yields zero
/// sources rather than silently falling back to markers.
pub fn resolve_sources(
    candidates: SourceCandidates,
    illustrative_fluid_enabled: bool,
    has_scenario_rows: bool,
) -> ResolvedSources {
    let SourceCandidates {
        marker,
        fluid,
        scenario,
        mut warnings,
    } = candidates;

    let mut policy = SourcePolicy {
        active_modes: Vec::new(),
        illustrative_fluid_enabled,
        explicit_scenario_active: has_scenario_rows,
        marker_candidate_count: marker.len(),
        fluid_candidate_count: fluid.len(),
        scenario_candidate_count: scenario.len(),
    };

    let entities = if has_scenario_rows {
        warnings.push(ValidationWarning::new(
            WarningCode::ExplicitScenarioSourceModeActive,
            "Breakout rows present: scenario sources replace marker and fluid sources",
        ));
        if illustrative_fluid_enabled {
            warnings.push(ValidationWarning::new(
                WarningCode::IllustrativeFluidSourceSuppressed,
                "Illustrative fluid sources are ignored while a scenario is declared",
            ));
        }
        if !scenario.is_empty() {
            policy.active_modes.push(PolicyMode::ScenarioExplicit);
        }
        scenario
    } else {
        if !marker.is_empty() {
            policy.active_modes.push(PolicyMode::MarkerDefault);
        }
        let mut entities = marker;
        if illustrative_fluid_enabled {
            warnings.push(ValidationWarning::new(
                WarningCode::IllustrativeFluidSourceModeEnabled,
                "Fluid columns are used as illustrative sources; not an engineering assessment",
            ));
            if !fluid.is_empty() {
                policy.active_modes.push(PolicyMode::FluidOptIn);
            }
            entities.extend(fluid);
        }
        entities
    };

    if entities.is_empty() {
        warnings.push(ValidationWarning::new(
            WarningCode::NoSourcesResolved,
            "No source could be resolved; flow and failure results are empty",
        ));
    }

    debug!(
        sources = entities.len(),
        scenario = has_scenario_rows,
        "Sources resolved"
    );

    ResolvedSources {
        entities,
        policy,
        warnings,
    }
}
