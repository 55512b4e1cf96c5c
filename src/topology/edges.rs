//! Edge builder: typed, costed connections between volume nodes.
//!
//! ## Edge categories
//!
//! | Kind          | Connects                               | Cost                          |
//! |---------------|----------------------------------------|-------------------------------|
//! | `vertical`    | same volume, contiguous intervals      | 0, or 1 / null at a seal      |
//! | `radial`      | adjacent volumes, same interval        | 1 while any wall or fill holds |
//! | `radial` (scenario) | breakout volumes over a depth range | always 0                   |
//! | `termination` | wellhead node of each volume → SURFACE | always 0                      |
//!
//! A cement or plug column is charged once on the vertical axis: at its top
//! when an open node sits above it, otherwise at its base, so a column that
//! runs up to the wellhead still counts before the cost-0 termination edge.
//!
//! Every edge carries a reason whose contributors list each row consulted,
//! so the envelope evaluator can attribute a cost-1 edge to physical rows.
//! Missing or inconsistent row data becomes a validation warning and a
//! conservative cost; it never stops the build.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::nodes::{NodeGraph, VolumeSlot};
use crate::config::EdgeConfig;
use crate::types::{
    BarrierCost, BreakoutRow, DepthRange, Edge, EdgeKind, EdgeReason, EdgeState, EdgeSubKind,
    EquipmentContributor, EquipmentFunction, EquipmentRow, IntervalStack, Layer, LayerRole,
    LayerRowKind, Node, NodeKind, ReasonDetails, TubularKind, TubularRow, TubularState,
    ValidationWarning, WarningCode, WellSnapshot,
};

// ─── Rule ids ─────────────────────────────────────────────────────────────────

pub mod rule {
    pub const VERTICAL_OPEN: &str = "vertical.open";
    pub const VERTICAL_SEAL: &str = "vertical.seal";
    pub const VERTICAL_SEAL_FAILED: &str = "vertical.seal_failed";
    pub const VERTICAL_BLOCKED_COLUMN_TOP: &str = "vertical.blocked_column_top";
    pub const VERTICAL_BLOCKED_COLUMN_BASE: &str = "vertical.blocked_column_base";
    pub const VERTICAL_OBSTRUCTED: &str = "vertical.obstructed";
    pub const RADIAL_NO_WALL: &str = "radial.no_wall";
    pub const RADIAL_WALL_INTACT: &str = "radial.wall_intact";
    pub const RADIAL_WALL_BREACHED: &str = "radial.wall_breached";
    pub const RADIAL_BLOCKED_FILL: &str = "radial.blocked_fill";
    pub const SCENARIO_BREAKOUT: &str = "scenario.breakout";
    pub const TERMINATION_WELLHEAD: &str = "termination.wellhead";
}

// ─── Function keys for contributors that are not equipment ────────────────────

pub mod function_key {
    pub const PIPE_WALL: &str = "pipe_wall";
    pub const BLOCKED_COLUMN: &str = "blocked_column";
    pub const BREAKOUT: &str = "breakout";
}

// ============================================================================
// Builder output
// ============================================================================

/// What each builder call returns.
#[derive(Debug, Clone, Default)]
pub struct EdgeBuildOutput {
    pub edges: Vec<Edge>,
    pub edge_reasons: BTreeMap<String, EdgeReason>,
    pub validation_warnings: Vec<ValidationWarning>,
}

impl EdgeBuildOutput {
    fn push(&mut self, edge: Edge) {
        self.edge_reasons
            .insert(edge.edge_id.clone(), edge.reason.clone());
        self.edges.push(edge);
    }

    fn warn(&mut self, warning: ValidationWarning) {
        self.validation_warnings.push(warning);
    }

    /// Append another builder's output, preserving order.
    pub fn merge(&mut self, other: EdgeBuildOutput) {
        self.edges.extend(other.edges);
        self.edge_reasons.extend(other.edge_reasons);
        self.validation_warnings.extend(other.validation_warnings);
    }
}

// ============================================================================
// Row index
// ============================================================================

/// Barrier-relevant rows, validated and indexed once per build.
#[derive(Debug)]
pub struct BarrierRows<'a> {
    tubulars: HashMap<&'a str, &'a TubularRow>,
    equipment: Vec<(&'a EquipmentRow, DepthRange)>,
}

impl<'a> BarrierRows<'a> {
    /// Index tubulars and equipment. Equipment without a usable depth range
    /// or host pipe is dropped with a warning.
    pub fn index(
        snapshot: &'a WellSnapshot,
        stacks: &[IntervalStack],
    ) -> (Self, Vec<ValidationWarning>) {
        let mut warnings = Vec::new();
        let tubulars = snapshot
            .tubulars
            .iter()
            .map(|t| (t.row_id.as_str(), t))
            .collect();

        let layer_rows: HashSet<&str> = stacks
            .iter()
            .flat_map(|s| s.layers.iter())
            .filter(|l| l.role == LayerRole::Pipe)
            .filter_map(Layer::source_row_id)
            .collect();

        let mut equipment = Vec::new();
        for row in &snapshot.equipment {
            let Some(range) = row.depth_range() else {
                warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::EquipmentMissingDepthRange,
                        &row.row_id,
                        format!("{} has no usable depth range", row.equipment_type.as_str()),
                    )
                    .with_fields(&["top", "bottom"]),
                );
                continue;
            };
            let host_found = row
                .host_row_id
                .as_deref()
                .is_some_and(|h| layer_rows.contains(h));
            if !host_found {
                warnings.push(
                    ValidationWarning::for_row(
                        WarningCode::EquipmentHostNotFound,
                        &row.row_id,
                        format!(
                            "{} host pipe {:?} does not appear in any stack",
                            row.equipment_type.as_str(),
                            row.host_row_id
                        ),
                    )
                    .with_fields(&["hostRowId"]),
                );
                continue;
            }
            equipment.push((row, range));
        }

        (Self { tubulars, equipment }, warnings)
    }

    fn equipment_with<'s>(
        &'s self,
        function: EquipmentFunction,
    ) -> impl Iterator<Item = (&'a EquipmentRow, DepthRange)> + 's {
        self.equipment
            .iter()
            .filter(move |(row, _)| row.equipment_type.function() == function)
            .copied()
    }
}

/// Everything a builder reads.
#[derive(Clone, Copy)]
pub struct EdgeContext<'a> {
    pub graph: &'a NodeGraph,
    pub stacks: &'a [IntervalStack],
    pub rows: &'a BarrierRows<'a>,
    pub config: &'a EdgeConfig,
}

impl EdgeContext<'_> {
    fn node(&self, slot: VolumeSlot) -> &Node {
        &self.graph.nodes[slot.node_index]
    }

    fn contiguous(&self, upper: usize, lower: usize) -> bool {
        let iv = &self.graph.intervals;
        (iv[upper].bottom - iv[lower].top).abs() <= self.config.depth_tolerance
    }

    /// Represented volumes just inside and outside a host pipe in an interval.
    fn volumes_around_host(
        &self,
        interval_index: usize,
        host_row_id: &str,
    ) -> (Option<VolumeSlot>, Option<VolumeSlot>) {
        let layers = &self.stacks[interval_index].layers;
        let Some(pipe_idx) = layers
            .iter()
            .position(|l| l.role == LayerRole::Pipe && l.source_row_id() == Some(host_row_id))
        else {
            return (None, None);
        };
        let slots = &self.graph.interval_volumes[interval_index];
        let inside = slots.iter().rev().find(|s| s.layer_index < pipe_idx).copied();
        let outside = slots.iter().find(|s| s.layer_index > pipe_idx).copied();
        (inside, outside)
    }
}

/// Build every edge category in a fixed order: vertical, radial, scenario,
/// termination.
pub fn build_all_edges(ctx: EdgeContext<'_>, breakouts: &[BreakoutRow]) -> EdgeBuildOutput {
    let mut out = build_vertical_edges(ctx);
    out.merge(build_radial_edges(ctx));
    out.merge(build_scenario_edges(ctx, breakouts));
    out.merge(build_termination_edges(ctx.graph, ctx.config));
    debug!(
        edges = out.edges.len(),
        warnings = out.validation_warnings.len(),
        "Edges built"
    );
    out
}

// ============================================================================
// Vertical edges
// ============================================================================

/// Seals and obstructions keyed by `(lower interval index, volume kind)`,
/// i.e. the boundary at the top of that interval.
#[derive(Debug, Default)]
struct VerticalBarriers {
    seals: HashMap<(usize, NodeKind), Vec<EquipmentContributor>>,
    obstructions: HashMap<(usize, NodeKind), Vec<EquipmentContributor>>,
}

/// Boundary a vertical seal acts on, as the index of the interval below it.
///
/// The shallowest contiguous boundary inside the row's range wins. A row that
/// sits wholly inside one interval acts on that interval's top boundary, or its
/// bottom boundary when the top is the wellhead. Each row therefore produces
/// exactly one vertical barrier.
fn anchor_boundary(ctx: &EdgeContext<'_>, range: &DepthRange) -> Option<usize> {
    let tol = ctx.config.depth_tolerance;
    let intervals = &ctx.graph.intervals;

    let inside = (1..intervals.len())
        .find(|&i| ctx.contiguous(i - 1, i) && range.contains(intervals[i].top, tol));
    if inside.is_some() {
        return inside;
    }

    let containing = intervals
        .iter()
        .position(|iv| range.overlaps(iv.top, iv.bottom, tol))?;
    if containing >= 1 && ctx.contiguous(containing - 1, containing) {
        Some(containing)
    } else if containing + 1 < intervals.len() && ctx.contiguous(containing, containing + 1) {
        Some(containing + 1)
    } else {
        None
    }
}

fn collect_vertical_barriers(ctx: &EdgeContext<'_>, out: &mut EdgeBuildOutput) -> VerticalBarriers {
    let mut barriers = VerticalBarriers::default();
    let unknown_is_intact = ctx.config.unknown_state_is_intact;

    let vertical_functions = [
        EquipmentFunction::AnnularSeal,
        EquipmentFunction::BoreSeal,
        EquipmentFunction::Obstruction,
    ];

    for function in vertical_functions {
        for (row, range) in ctx.rows.equipment_with(function) {
            let host = row.host_row_id.as_deref().unwrap_or_default();
            let anchored = anchor_boundary(ctx, &range).and_then(|lower| {
                // Resolve the sealed volume in whichever neighbour holds the host
                [lower, lower - 1].into_iter().find_map(|i| {
                    let (inside, outside) = ctx.volumes_around_host(i, host);
                    let slot = match function {
                        EquipmentFunction::AnnularSeal => outside,
                        _ => inside,
                    }?;
                    Some((lower, slot.kind))
                })
            });

            let Some(key) = anchored else {
                out.warn(
                    ValidationWarning::for_row(
                        WarningCode::EquipmentNoResolvableInterval,
                        &row.row_id,
                        format!(
                            "{} at {:.1}-{:.1} does not sit on a modeled volume boundary",
                            row.equipment_type.as_str(),
                            range.top,
                            range.bottom
                        ),
                    )
                    .with_fields(&["top", "bottom", "hostRowId"]),
                );
                continue;
            };

            let holding = row.state.is_holding(unknown_is_intact);
            let contributor = EquipmentContributor {
                row_id: row.row_id.clone(),
                equipment_type: row.equipment_type.as_str().to_string(),
                cost: match (function, holding) {
                    (EquipmentFunction::Obstruction, true) => None,
                    (_, true) => Some(BarrierCost::Barrier),
                    (_, false) => Some(BarrierCost::Open),
                },
                state: row.state.as_str().to_string(),
                function_key: function.key().to_string(),
            };
            let target = if function == EquipmentFunction::Obstruction {
                &mut barriers.obstructions
            } else {
                &mut barriers.seals
            };
            target.entry(key).or_default().push(contributor);
        }
    }

    barriers
}

/// One edge per volume kind present on both sides of each contiguous boundary.
pub fn build_vertical_edges(ctx: EdgeContext<'_>) -> EdgeBuildOutput {
    let mut out = EdgeBuildOutput::default();
    let barriers = collect_vertical_barriers(&ctx, &mut out);

    for lower_index in 1..ctx.graph.intervals.len() {
        let upper_index = lower_index - 1;
        if !ctx.contiguous(upper_index, lower_index) {
            continue;
        }
        let boundary = ctx.graph.intervals[lower_index].top;

        for &slot in &ctx.graph.interval_volumes[upper_index] {
            let Some(lower) = ctx.graph.node_at(lower_index, slot.kind) else {
                continue;
            };
            let upper = ctx.node(slot);
            let key = (lower_index, slot.kind);
            let column = if lower.meta.is_blocked && !upper.meta.is_blocked {
                ColumnBoundary::Top
            } else if upper.meta.is_blocked
                && !lower.meta.is_blocked
                && blocked_to_wellhead(&ctx, upper_index, slot.kind)
            {
                ColumnBoundary::Base
            } else {
                ColumnBoundary::None
            };
            let edge = vertical_edge(
                upper,
                lower,
                boundary,
                lower_index,
                column,
                barriers.seals.get(&key).map(Vec::as_slice).unwrap_or_default(),
                barriers
                    .obstructions
                    .get(&key)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
            );
            out.push(edge);
        }
    }

    out
}

/// Where a vertical boundary sits relative to a blocked column of its volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnBoundary {
    None,
    /// Open node above, blocked node below
    Top,
    /// Blocked node above that runs up to the wellhead, open node below
    Base,
}

/// True when `kind` is blocked in every interval from `interval_index` up to
/// the wellhead, with no gap in between.
fn blocked_to_wellhead(ctx: &EdgeContext<'_>, interval_index: usize, kind: NodeKind) -> bool {
    let mut i = interval_index;
    loop {
        if !ctx.graph.node_at(i, kind).is_some_and(|n| n.meta.is_blocked) {
            return false;
        }
        if i == 0 {
            return true;
        }
        if !ctx.contiguous(i - 1, i) {
            return false;
        }
        i -= 1;
    }
}

/// Contributor for the cement or plug that blocks a node, if it has a row.
fn blocking_fill(node: &Node) -> Option<EquipmentContributor> {
    if !node.meta.is_blocked {
        return None;
    }
    let row_id = node.meta.blocking_row_id.clone()?;
    Some(EquipmentContributor {
        row_id,
        equipment_type: node
            .meta
            .blocking_material
            .clone()
            .unwrap_or_else(|| "cement".to_string()),
        cost: Some(BarrierCost::Barrier),
        state: "in_place".to_string(),
        function_key: function_key::BLOCKED_COLUMN.to_string(),
    })
}

fn vertical_edge(
    upper: &Node,
    lower: &Node,
    boundary: f64,
    lower_index: usize,
    column: ColumnBoundary,
    seals: &[EquipmentContributor],
    obstructions: &[EquipmentContributor],
) -> Edge {
    let mut contributors: Vec<EquipmentContributor> =
        obstructions.iter().chain(seals.iter()).cloned().collect();

    let obstructed = obstructions.iter().any(|c| c.cost.is_none());
    let seal_holding = seals.iter().any(|c| c.cost == Some(BarrierCost::Barrier));

    let fill = match column {
        ColumnBoundary::Top => blocking_fill(lower),
        ColumnBoundary::Base => blocking_fill(upper),
        ColumnBoundary::None => None,
    };
    contributors.extend(fill);

    let (cost, rule_id, summary) = if obstructed {
        (None, rule::VERTICAL_OBSTRUCTED, format!("{} obstructed at {boundary:.1}", lower.kind))
    } else if seal_holding {
        (
            Some(BarrierCost::Barrier),
            rule::VERTICAL_SEAL,
            format!("{} sealed at {boundary:.1}", lower.kind),
        )
    } else if column == ColumnBoundary::Top {
        (
            Some(BarrierCost::Barrier),
            rule::VERTICAL_BLOCKED_COLUMN_TOP,
            format!("Top of blocked {} column at {boundary:.1}", lower.kind),
        )
    } else if column == ColumnBoundary::Base {
        (
            Some(BarrierCost::Barrier),
            rule::VERTICAL_BLOCKED_COLUMN_BASE,
            format!(
                "Base of blocked {} column at {boundary:.1}, blocked up to the wellhead",
                upper.kind
            ),
        )
    } else if !seals.is_empty() {
        (
            Some(BarrierCost::Open),
            rule::VERTICAL_SEAL_FAILED,
            format!("{} seal at {boundary:.1} is not holding", lower.kind),
        )
    } else {
        (
            Some(BarrierCost::Open),
            rule::VERTICAL_OPEN,
            format!("{} continuous across {boundary:.1}", lower.kind),
        )
    };

    Edge {
        edge_id: format!("edge:vertical:{}->{}", upper.node_id, lower.node_id),
        kind: EdgeKind::Vertical,
        sub_kind: None,
        from: upper.node_id.clone(),
        to: lower.node_id.clone(),
        cost,
        state: EdgeState::from_cost(cost),
        reason: EdgeReason {
            rule_id: rule_id.to_string(),
            summary,
            details: ReasonDetails {
                equipment_contributors: contributors,
                boundary_depth: Some(boundary),
                interval_index: Some(lower_index),
            },
        },
    }
}

// ============================================================================
// Radial edges
// ============================================================================

struct WallAssessment {
    breached: bool,
    contributors: Vec<EquipmentContributor>,
}

fn tubular_type(kind: TubularKind) -> &'static str {
    match kind {
        TubularKind::Casing => "casing",
        TubularKind::Liner => "liner",
        TubularKind::Tubing => "tubing",
    }
}

fn layer_row_type(kind: LayerRowKind) -> &'static str {
    match kind {
        LayerRowKind::Casing => "casing",
        LayerRowKind::Liner => "liner",
        LayerRowKind::Tubing => "tubing",
        LayerRowKind::Cement => "cement",
        LayerRowKind::Fluid => "fluid",
        LayerRowKind::Equipment => "equipment",
        LayerRowKind::Formation => "formation",
    }
}

/// Worst-case state of one pipe wall over an interval: breached when the
/// string itself leaks there or any wall port on it is not holding.
fn assess_wall(ctx: &EdgeContext<'_>, wall: &Layer, interval_index: usize) -> WallAssessment {
    let tol = ctx.config.depth_tolerance;
    let unknown_is_intact = ctx.config.unknown_state_is_intact;
    let iv = &ctx.graph.intervals[interval_index];
    let mut contributors = Vec::new();
    let mut breached = false;

    let Some(source) = wall.source.as_ref() else {
        return WallAssessment {
            breached: false,
            contributors,
        };
    };

    let (equipment_type, state, wall_breached) = match ctx.rows.tubulars.get(source.row_id.as_str()) {
        Some(tubular) => {
            let failing_here = tubular
                .failure_range()
                .map_or(true, |r| r.overlaps(iv.top, iv.bottom, tol));
            let failed = match tubular.state {
                TubularState::Leaking | TubularState::Parted => failing_here,
                TubularState::Intact => false,
                TubularState::Unknown => !unknown_is_intact,
            };
            (tubular_type(tubular.kind), tubular.state.as_str(), failed)
        }
        None => (
            layer_row_type(source.row_kind),
            TubularState::Unknown.as_str(),
            !unknown_is_intact,
        ),
    };
    breached |= wall_breached;
    contributors.push(EquipmentContributor {
        row_id: source.row_id.clone(),
        equipment_type: equipment_type.to_string(),
        cost: Some(if wall_breached {
            BarrierCost::Open
        } else {
            BarrierCost::Barrier
        }),
        state: state.to_string(),
        function_key: function_key::PIPE_WALL.to_string(),
    });

    for (row, range) in ctx.rows.equipment_with(EquipmentFunction::WallPort) {
        if row.host_row_id.as_deref() != Some(source.row_id.as_str())
            || !range.overlaps(iv.top, iv.bottom, tol)
        {
            continue;
        }
        let holding = row.state.is_holding(unknown_is_intact);
        breached |= !holding;
        contributors.push(EquipmentContributor {
            row_id: row.row_id.clone(),
            equipment_type: row.equipment_type.as_str().to_string(),
            cost: Some(if holding {
                BarrierCost::Barrier
            } else {
                BarrierCost::Open
            }),
            state: row.state.as_str().to_string(),
            function_key: EquipmentFunction::WallPort.key().to_string(),
        });
    }

    WallAssessment {
        breached,
        contributors,
    }
}

/// One edge per radially adjacent pair of represented volumes.
pub fn build_radial_edges(ctx: EdgeContext<'_>) -> EdgeBuildOutput {
    let mut out = EdgeBuildOutput::default();

    for (interval_index, slots) in ctx.graph.interval_volumes.iter().enumerate() {
        let layers = &ctx.stacks[interval_index].layers;
        for pair in slots.windows(2) {
            let (inner_slot, outer_slot) = (pair[0], pair[1]);
            let inner = ctx.node(inner_slot);
            let outer = ctx.node(outer_slot);

            let walls: Vec<WallAssessment> = layers[inner_slot.layer_index + 1..outer_slot.layer_index]
                .iter()
                .filter(|l| l.role == LayerRole::Pipe)
                .map(|l| assess_wall(&ctx, l, interval_index))
                .collect();

            // Cement or a plug on either side seals the wall even where it leaks
            let filled = inner.meta.is_blocked || outer.meta.is_blocked;
            let mut fills: Vec<EquipmentContributor> = Vec::new();
            for fill in [inner, outer].into_iter().filter_map(blocking_fill) {
                if !fills.iter().any(|f| f.row_id == fill.row_id) {
                    fills.push(fill);
                }
            }

            let (cost, rule_id, summary) = if walls.iter().any(|w| !w.breached) {
                (
                    BarrierCost::Barrier,
                    rule::RADIAL_WALL_INTACT,
                    format!("Wall between {} and {} is intact", inner.kind, outer.kind),
                )
            } else if filled {
                (
                    BarrierCost::Barrier,
                    rule::RADIAL_BLOCKED_FILL,
                    format!(
                        "Blocked fill between {} and {} holds",
                        inner.kind, outer.kind
                    ),
                )
            } else if walls.is_empty() {
                (
                    BarrierCost::Open,
                    rule::RADIAL_NO_WALL,
                    format!("No wall between {} and {}", inner.kind, outer.kind),
                )
            } else {
                (
                    BarrierCost::Open,
                    rule::RADIAL_WALL_BREACHED,
                    format!("Wall between {} and {} is breached", inner.kind, outer.kind),
                )
            };

            out.push(Edge {
                edge_id: format!("edge:radial:{}->{}", inner.node_id, outer.node_id),
                kind: EdgeKind::Radial,
                sub_kind: None,
                from: inner.node_id.clone(),
                to: outer.node_id.clone(),
                cost: Some(cost),
                state: EdgeState::from_cost(Some(cost)),
                reason: EdgeReason {
                    rule_id: rule_id.to_string(),
                    summary,
                    details: ReasonDetails {
                        equipment_contributors: walls
                            .into_iter()
                            .flat_map(|w| w.contributors)
                            .chain(fills)
                            .collect(),
                        boundary_depth: None,
                        interval_index: Some(interval_index),
                    },
                },
            });
        }
    }

    out
}

// ============================================================================
// Scenario-radial edges
// ============================================================================

/// One cost-0 radial edge per interval covered by each breakout row.
pub fn build_scenario_edges(ctx: EdgeContext<'_>, breakouts: &[BreakoutRow]) -> EdgeBuildOutput {
    let mut out = EdgeBuildOutput::default();
    let tol = ctx.config.depth_tolerance;

    for row in breakouts {
        let Some((from_volume, to_volume)) = row.volume_pair() else {
            out.warn(
                ValidationWarning::for_row(
                    WarningCode::ScenarioBreakoutMissingVolumePair,
                    &row.row_id,
                    "Breakout needs two distinct volumes",
                )
                .with_fields(&["fromVolume", "toVolume"]),
            );
            continue;
        };
        let Some(range) = row.depth_range() else {
            out.warn(
                ValidationWarning::for_row(
                    WarningCode::ScenarioBreakoutMissingDepthRange,
                    &row.row_id,
                    "Breakout has no usable depth range",
                )
                .with_fields(&["top", "bottom"]),
            );
            continue;
        };

        let mut added = 0usize;
        for (i, iv) in ctx.graph.intervals.iter().enumerate() {
            if !range.overlaps(iv.top, iv.bottom, tol) {
                continue;
            }
            let (Some(from), Some(to)) = (
                ctx.graph.node_at(i, from_volume.node_kind()),
                ctx.graph.node_at(i, to_volume.node_kind()),
            ) else {
                continue;
            };
            added += 1;
            out.push(Edge {
                edge_id: format!("edge:scenario:{}:{}->{}", row.row_id, from.node_id, to.node_id),
                kind: EdgeKind::Radial,
                sub_kind: Some(EdgeSubKind::Scenario),
                from: from.node_id.clone(),
                to: to.node_id.clone(),
                cost: Some(BarrierCost::Open),
                state: EdgeState::Open,
                reason: EdgeReason {
                    rule_id: rule::SCENARIO_BREAKOUT.to_string(),
                    summary: format!(
                        "Declared breakout {} between {} and {}",
                        row.label.as_deref().unwrap_or(&row.row_id),
                        from.kind,
                        to.kind
                    ),
                    details: ReasonDetails {
                        equipment_contributors: vec![EquipmentContributor {
                            row_id: row.row_id.clone(),
                            equipment_type: "scenario_breakout".to_string(),
                            cost: Some(BarrierCost::Open),
                            state: "declared".to_string(),
                            function_key: function_key::BREAKOUT.to_string(),
                        }],
                        boundary_depth: None,
                        interval_index: Some(i),
                    },
                },
            });
        }

        if added == 0 {
            out.warn(
                ValidationWarning::for_row(
                    WarningCode::ScenarioBreakoutNoResolvableInterval,
                    &row.row_id,
                    format!(
                        "No interval in {:.1}-{:.1} models both {:?} and {:?}",
                        range.top, range.bottom, from_volume, to_volume
                    ),
                )
                .with_fields(&["top", "bottom", "fromVolume", "toVolume"]),
            );
        }
    }

    out
}

// ============================================================================
// Termination edges
// ============================================================================

/// Cost-0 edge from the shallowest node of every volume that reaches the
/// wellhead to SURFACE.
pub fn build_termination_edges(graph: &NodeGraph, config: &EdgeConfig) -> EdgeBuildOutput {
    let mut out = EdgeBuildOutput::default();
    let Some(wellhead) = graph.intervals.first().map(|iv| iv.top) else {
        return out;
    };
    let surface_id = graph.surface().node_id.clone();

    let mut seen: HashSet<NodeKind> = HashSet::new();
    for (i, slots) in graph.interval_volumes.iter().enumerate() {
        for slot in slots {
            if !seen.insert(slot.kind) {
                continue;
            }
            if (graph.intervals[i].top - wellhead).abs() > config.depth_tolerance {
                continue;
            }
            let node = &graph.nodes[slot.node_index];
            out.push(Edge {
                edge_id: format!("edge:termination:{}", node.node_id),
                kind: EdgeKind::Termination,
                sub_kind: None,
                from: node.node_id.clone(),
                to: surface_id.clone(),
                cost: Some(BarrierCost::Open),
                state: EdgeState::Open,
                reason: EdgeReason {
                    rule_id: rule::TERMINATION_WELLHEAD.to_string(),
                    summary: format!("{} reaches surface at the wellhead", node.kind),
                    details: ReasonDetails::default(),
                },
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeConfig, NodeConfig};
    use crate::topology::fixtures::*;
    use crate::topology::nodes::build_nodes;
    use crate::types::{EquipmentState, EquipmentType, Material, VolumeRef};

    fn build(snapshot: &WellSnapshot) -> (NodeGraph, EdgeBuildOutput) {
        let graph = build_nodes(&snapshot.intervals, &NodeConfig::default());
        let config = EdgeConfig::default();
        let (rows, mut warnings) = BarrierRows::index(snapshot, &snapshot.intervals);
        let ctx = EdgeContext {
            graph: &graph,
            stacks: &snapshot.intervals,
            rows: &rows,
            config: &config,
        };
        let mut out = build_all_edges(ctx, &snapshot.breakouts);
        warnings.append(&mut out.validation_warnings);
        out.validation_warnings = warnings;
        (graph, out)
    }

    fn edge<'e>(out: &'e EdgeBuildOutput, id: &str) -> &'e Edge {
        out.edges
            .iter()
            .find(|e| e.edge_id == id)
            .unwrap_or_else(|| panic!("missing edge {id}"))
    }

    #[test]
    fn intact_completion_edges() {
        let (_, out) = build(&intact_well());

        let vertical = out.edges.iter().filter(|e| e.kind == EdgeKind::Vertical).count();
        let radial = out.edges.iter().filter(|e| e.kind == EdgeKind::Radial).count();
        let termination = out
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Termination)
            .count();
        // bore/A/B across 1000, bore/A across 2000; 2 walls × 3 intervals;
        // bore, A and cemented B reach the wellhead
        assert_eq!((vertical, radial, termination), (5, 6, 3));

        let bore_to_a = edge(
            &out,
            "edge:radial:node:TUBING_INNER:0:1000->node:ANNULUS_A:0:1000",
        );
        assert_eq!(bore_to_a.cost, Some(BarrierCost::Barrier));
        assert_eq!(bore_to_a.reason.rule_id, rule::RADIAL_WALL_INTACT);
        assert_eq!(
            bore_to_a.reason.details.equipment_contributors[0].function_key,
            function_key::PIPE_WALL
        );

        let vertical_bore = edge(
            &out,
            "edge:vertical:node:TUBING_INNER:0:1000->node:TUBING_INNER:1000:2000",
        );
        assert_eq!(vertical_bore.cost, Some(BarrierCost::Open));
        assert!(out.validation_warnings.is_empty());
        assert_eq!(out.edge_reasons.len(), out.edges.len());
    }

    #[test]
    fn leaking_tubing_opens_radial_edge_only_where_failed() {
        let mut snapshot = intact_well();
        snapshot.tubulars[0].state = TubularState::Leaking;
        snapshot.tubulars[0].failure_top = Some(1200.0);
        snapshot.tubulars[0].failure_bottom = Some(1300.0);
        let (_, out) = build(&snapshot);

        let shallow = edge(
            &out,
            "edge:radial:node:TUBING_INNER:0:1000->node:ANNULUS_A:0:1000",
        );
        let leaking = edge(
            &out,
            "edge:radial:node:TUBING_INNER:1000:2000->node:ANNULUS_A:1000:2000",
        );
        assert_eq!(shallow.cost, Some(BarrierCost::Barrier));
        assert_eq!(leaking.cost, Some(BarrierCost::Open));
        assert_eq!(leaking.reason.rule_id, rule::RADIAL_WALL_BREACHED);
    }

    #[test]
    fn open_sliding_sleeve_breaches_tubing_wall() {
        let mut snapshot = intact_well();
        snapshot.equipment.push(equipment(
            "ssd-1",
            EquipmentType::SlidingSleeve,
            "tbg",
            2500.0,
            EquipmentState::Open,
        ));
        let (_, out) = build(&snapshot);
        let e = edge(
            &out,
            "edge:radial:node:TUBING_INNER:2000:3000->node:ANNULUS_A:2000:3000",
        );
        assert_eq!(e.cost, Some(BarrierCost::Open));
        assert!(e
            .reason
            .details
            .equipment_contributors
            .iter()
            .any(|c| c.row_id == "ssd-1" && c.function_key == "wall_port"));
    }

    #[test]
    fn packer_seals_annulus_at_one_boundary() {
        let mut snapshot = intact_well();
        snapshot.equipment.push(equipment(
            "pkr-1",
            EquipmentType::Packer,
            "tbg",
            2000.0,
            EquipmentState::Intact,
        ));
        let (_, out) = build(&snapshot);

        let sealed: Vec<&Edge> = out
            .edges
            .iter()
            .filter(|e| e.reason.rule_id == rule::VERTICAL_SEAL)
            .collect();
        assert_eq!(sealed.len(), 1);
        assert_eq!(
            sealed[0].edge_id,
            "edge:vertical:node:ANNULUS_A:1000:2000->node:ANNULUS_A:2000:3000"
        );
        assert_eq!(sealed[0].cost, Some(BarrierCost::Barrier));
        assert_eq!(
            sealed[0].reason.details.equipment_contributors[0].function_key,
            "annular_seal"
        );
    }

    #[test]
    fn failed_packer_is_recorded_but_open() {
        let mut snapshot = intact_well();
        snapshot.equipment.push(equipment(
            "pkr-1",
            EquipmentType::Packer,
            "tbg",
            1500.0,
            EquipmentState::Failed,
        ));
        let (_, out) = build(&snapshot);
        let e = edge(
            &out,
            "edge:vertical:node:ANNULUS_A:0:1000->node:ANNULUS_A:1000:2000",
        );
        assert_eq!(e.cost, Some(BarrierCost::Open));
        assert_eq!(e.reason.rule_id, rule::VERTICAL_SEAL_FAILED);
    }

    #[test]
    fn obstruction_makes_bore_impassable() {
        let mut snapshot = intact_well();
        snapshot.equipment.push(equipment(
            "fish-1",
            EquipmentType::Obstruction,
            "tbg",
            1000.0,
            EquipmentState::Intact,
        ));
        let (_, out) = build(&snapshot);
        let e = edge(
            &out,
            "edge:vertical:node:TUBING_INNER:0:1000->node:TUBING_INNER:1000:2000",
        );
        assert_eq!(e.cost, None);
        assert_eq!(e.state, EdgeState::Impassable);
    }

    #[test]
    fn cemented_annulus_charged_once_at_column_top() {
        let mut cemented = completion_layers();
        cemented[2].material = Material::Cement;
        let mut intervals = uniform_stacks(&[0.0, 1000.0], &completion_layers());
        intervals.extend(uniform_stacks(&[1000.0, 2000.0, 3000.0], &cemented));
        let snapshot = WellSnapshot {
            intervals,
            ..intact_well()
        };
        let (_, out) = build(&snapshot);

        let top = edge(
            &out,
            "edge:vertical:node:ANNULUS_A:0:1000->node:ANNULUS_A:1000:2000",
        );
        let inside = edge(
            &out,
            "edge:vertical:node:ANNULUS_A:1000:2000->node:ANNULUS_A:2000:3000",
        );
        assert_eq!(top.reason.rule_id, rule::VERTICAL_BLOCKED_COLUMN_TOP);
        assert_eq!(top.cost, Some(BarrierCost::Barrier));
        assert_eq!(inside.cost, Some(BarrierCost::Open));
    }

    #[test]
    fn plug_reaching_wellhead_is_charged_at_its_base() {
        let plug = Layer {
            source: Some(crate::types::LayerSource {
                row_id: "plug-1".to_string(),
                row_kind: LayerRowKind::Cement,
            }),
            ..layer(LayerRole::Core, Material::Cement, 0.0, 1.5)
        };
        let fluid = layer(LayerRole::Core, Material::Fluid, 0.0, 1.5);
        let mut intervals = uniform_stacks(&[0.0, 100.0], &[plug]);
        intervals.extend(uniform_stacks(&[100.0, 200.0, 300.0], &[fluid]));
        let (_, out) = build(&WellSnapshot {
            intervals,
            ..WellSnapshot::default()
        });

        let base = edge(
            &out,
            "edge:vertical:node:TUBING_INNER:0:100->node:TUBING_INNER:100:200",
        );
        assert_eq!(base.cost, Some(BarrierCost::Barrier));
        assert_eq!(base.reason.rule_id, rule::VERTICAL_BLOCKED_COLUMN_BASE);
        let fill = &base.reason.details.equipment_contributors;
        assert_eq!(fill.len(), 1);
        assert_eq!(fill[0].row_id, "plug-1");
        assert_eq!(fill[0].function_key, function_key::BLOCKED_COLUMN);

        let below = edge(
            &out,
            "edge:vertical:node:TUBING_INNER:100:200->node:TUBING_INNER:200:300",
        );
        assert_eq!(below.cost, Some(BarrierCost::Open));
        // Termination stays free; the plug is paid for once, at its base
        let term = edge(&out, "edge:termination:node:TUBING_INNER:0:100");
        assert_eq!(term.cost, Some(BarrierCost::Open));
    }

    #[test]
    fn buried_column_is_charged_at_top_only() {
        let mut cemented = completion_layers();
        cemented[2].material = Material::Cement;
        let mut intervals = uniform_stacks(&[0.0, 1000.0], &completion_layers());
        intervals.extend(uniform_stacks(&[1000.0, 2000.0], &cemented));
        intervals.extend(uniform_stacks(&[2000.0, 3000.0], &completion_layers()));
        let (_, out) = build(&WellSnapshot {
            intervals,
            ..intact_well()
        });

        let base = edge(
            &out,
            "edge:vertical:node:ANNULUS_A:1000:2000->node:ANNULUS_A:2000:3000",
        );
        assert_eq!(base.cost, Some(BarrierCost::Open));
        assert_eq!(base.reason.rule_id, rule::VERTICAL_OPEN);
        assert_eq!(
            out.edges
                .iter()
                .filter(|e| e.reason.rule_id == rule::VERTICAL_BLOCKED_COLUMN_TOP)
                .count(),
            1
        );
    }

    #[test]
    fn cement_sheath_holds_behind_leaking_casing() {
        let mut snapshot = intact_well();
        snapshot.tubulars[1].state = TubularState::Leaking;
        let (_, out) = build(&snapshot);

        let sheathed = edge(
            &out,
            "edge:radial:node:ANNULUS_A:0:1000->node:ANNULUS_B:0:1000",
        );
        assert_eq!(sheathed.cost, Some(BarrierCost::Barrier));
        assert_eq!(sheathed.reason.rule_id, rule::RADIAL_BLOCKED_FILL);
        let rows: Vec<(&str, Option<BarrierCost>)> = sheathed
            .reason
            .details
            .equipment_contributors
            .iter()
            .map(|c| (c.row_id.as_str(), c.cost))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("csg", Some(BarrierCost::Open)),
                ("cmt-1", Some(BarrierCost::Barrier))
            ]
        );

        // Open hole below the cement has nothing behind the casing
        let open_hole = edge(
            &out,
            "edge:radial:node:ANNULUS_A:2000:3000->node:FORMATION_ANNULUS:2000:3000",
        );
        assert_eq!(open_hole.cost, Some(BarrierCost::Open));
        assert_eq!(open_hole.reason.rule_id, rule::RADIAL_WALL_BREACHED);
    }

    #[test]
    fn intact_wall_keeps_cement_as_extra_contributor() {
        let (_, out) = build(&intact_well());
        let e = edge(
            &out,
            "edge:radial:node:ANNULUS_A:1000:2000->node:ANNULUS_B:1000:2000",
        );
        assert_eq!(e.reason.rule_id, rule::RADIAL_WALL_INTACT);
        let keys: Vec<&str> = e
            .reason
            .details
            .equipment_contributors
            .iter()
            .map(|c| c.function_key.as_str())
            .collect();
        assert_eq!(keys, vec![function_key::PIPE_WALL, function_key::BLOCKED_COLUMN]);
    }

    #[test]
    fn equipment_without_host_is_dropped_with_warning() {
        let mut snapshot = intact_well();
        snapshot.equipment.push(equipment(
            "pkr-x",
            EquipmentType::Packer,
            "missing",
            1500.0,
            EquipmentState::Intact,
        ));
        let mut no_depth = equipment("pkr-y", EquipmentType::Packer, "tbg", 0.0, EquipmentState::Intact);
        no_depth.top = None;
        no_depth.bottom = None;
        snapshot.equipment.push(no_depth);

        let (_, out) = build(&snapshot);
        let codes: Vec<WarningCode> = out.validation_warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![
                WarningCode::EquipmentHostNotFound,
                WarningCode::EquipmentMissingDepthRange
            ]
        );
        assert!(!out.edges.iter().any(|e| e.reason.rule_id == rule::VERTICAL_SEAL));
    }

    #[test]
    fn breakout_adds_cost_zero_scenario_edges() {
        let mut snapshot = intact_well();
        snapshot.breakouts.push(breakout(
            "brk-1",
            VolumeRef::AnnulusA,
            VolumeRef::AnnulusB,
            500.0,
            1500.0,
        ));
        let (_, out) = build(&snapshot);
        let scenario: Vec<&Edge> = out.edges.iter().filter(|e| e.is_scenario()).collect();
        assert_eq!(scenario.len(), 2);
        assert!(scenario.iter().all(|e| e.cost == Some(BarrierCost::Open)));
        assert_eq!(
            scenario[0].edge_id,
            "edge:scenario:brk-1:node:ANNULUS_A:0:1000->node:ANNULUS_B:0:1000"
        );
    }

    #[test]
    fn malformed_breakouts_warn() {
        let mut snapshot = intact_well();
        let mut no_pair = breakout(
            "brk-1",
            VolumeRef::AnnulusA,
            VolumeRef::AnnulusA,
            0.0,
            10.0,
        );
        no_pair.to_volume = None;
        let mut no_range = breakout(
            "brk-2",
            VolumeRef::AnnulusA,
            VolumeRef::Formation,
            0.0,
            10.0,
        );
        no_range.top = None;
        no_range.bottom = None;
        let nowhere = breakout(
            "brk-3",
            VolumeRef::AnnulusA,
            VolumeRef::AnnulusD,
            0.0,
            10.0,
        );
        snapshot.breakouts = vec![no_pair, no_range, nowhere];

        let (_, out) = build(&snapshot);
        let codes: Vec<WarningCode> = out.validation_warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![
                WarningCode::ScenarioBreakoutMissingVolumePair,
                WarningCode::ScenarioBreakoutMissingDepthRange,
                WarningCode::ScenarioBreakoutNoResolvableInterval,
            ]
        );
    }

    #[test]
    fn termination_requires_wellhead_interval() {
        let snapshot = WellSnapshot {
            intervals: uniform_stacks(&[500.0, 1000.0], &completion_layers()),
            ..WellSnapshot::default()
        };
        let (_, out) = build(&snapshot);
        assert_eq!(
            out.edges
                .iter()
                .filter(|e| e.kind == EdgeKind::Termination)
                .count(),
            3
        );

        // A volume that first appears below the wellhead never terminates
        let mut deeper = completion_layers();
        deeper.push(annulus(2, Material::Fluid, 6.0, 7.0));
        let mut intervals = uniform_stacks(&[0.0, 1000.0], &completion_layers());
        intervals.extend(uniform_stacks(&[1000.0, 2000.0], &deeper));
        let (graph, out) = build(&WellSnapshot {
            intervals,
            ..WellSnapshot::default()
        });
        let c = graph.node_at(1, NodeKind::AnnulusC).unwrap();
        assert!(!out.edges.iter().any(|e| e.from == c.node_id && e.kind == EdgeKind::Termination));
    }
}
