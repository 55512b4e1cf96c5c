//! Topology graph types: volume nodes and typed barrier edges

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Nodes
// ============================================================================

/// Kind of modeled volume. Closed set; exhaustive matches are intentional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Surface,
    TubingInner,
    AnnulusA,
    AnnulusB,
    AnnulusC,
    AnnulusD,
    FormationAnnulus,
}

impl NodeKind {
    /// Annulus kinds in slot order (A = 0).
    pub const ANNULUS_SLOTS: [NodeKind; 4] = [
        NodeKind::AnnulusA,
        NodeKind::AnnulusB,
        NodeKind::AnnulusC,
        NodeKind::AnnulusD,
    ];

    pub fn annulus(slot: u8) -> Option<Self> {
        Self::ANNULUS_SLOTS.get(usize::from(slot)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Surface => "SURFACE",
            NodeKind::TubingInner => "TUBING_INNER",
            NodeKind::AnnulusA => "ANNULUS_A",
            NodeKind::AnnulusB => "ANNULUS_B",
            NodeKind::AnnulusC => "ANNULUS_C",
            NodeKind::AnnulusD => "ANNULUS_D",
            NodeKind::FormationAnnulus => "FORMATION_ANNULUS",
        }
    }

    /// Stable key shared by every node of the same volume across depths.
    pub fn volume_key(self) -> &'static str {
        match self {
            NodeKind::Surface => "surface",
            NodeKind::TubingInner => "tubing_inner",
            NodeKind::AnnulusA => "annulus_a",
            NodeKind::AnnulusB => "annulus_b",
            NodeKind::AnnulusC => "annulus_c",
            NodeKind::AnnulusD => "annulus_d",
            NodeKind::FormationAnnulus => "formation_annulus",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volume named by an editable row (marker, fluid, breakout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeRef {
    Bore,
    AnnulusA,
    AnnulusB,
    AnnulusC,
    AnnulusD,
    Formation,
}

impl VolumeRef {
    pub fn node_kind(self) -> NodeKind {
        match self {
            VolumeRef::Bore => NodeKind::TubingInner,
            VolumeRef::AnnulusA => NodeKind::AnnulusA,
            VolumeRef::AnnulusB => NodeKind::AnnulusB,
            VolumeRef::AnnulusC => NodeKind::AnnulusC,
            VolumeRef::AnnulusD => NodeKind::AnnulusD,
            VolumeRef::Formation => NodeKind::FormationAnnulus,
        }
    }
}

/// What the bore node is bounded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerChannel {
    Tubing,
    Casing,
    OpenWellbore,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    /// Volume is filled with cement or a plug over this interval
    pub is_blocked: bool,
    /// Row that supplied the blocking fill, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_row_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_channel: Option<InnerChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_index: Option<usize>,
}

/// A modeled fluid-bearing volume at one depth interval (or SURFACE).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_id: String,
    pub kind: NodeKind,
    pub depth_top: Option<f64>,
    pub depth_bottom: Option<f64>,
    pub volume_key: String,
    pub meta: NodeMeta,
}

pub const SURFACE_NODE_ID: &str = "node:SURFACE";

impl Node {
    pub fn surface() -> Self {
        Self {
            node_id: SURFACE_NODE_ID.to_string(),
            kind: NodeKind::Surface,
            depth_top: None,
            depth_bottom: None,
            volume_key: NodeKind::Surface.volume_key().to_string(),
            meta: NodeMeta::default(),
        }
    }

    pub fn volume(kind: NodeKind, top: f64, bottom: f64, meta: NodeMeta) -> Self {
        Self {
            node_id: node_id(kind, top, bottom),
            kind,
            depth_top: Some(top),
            depth_bottom: Some(bottom),
            volume_key: kind.volume_key().to_string(),
            meta,
        }
    }
}

/// Deterministic node id: `node:{KIND}:{top}:{bottom}`.
pub fn node_id(kind: NodeKind, top: f64, bottom: f64) -> String {
    format!("node:{}:{}:{}", kind.as_str(), format_depth(top), format_depth(bottom))
}

/// Render a depth compactly and stably: whole numbers without a fraction,
/// everything else to at most three decimals.
pub fn format_depth(depth: f64) -> String {
    let rounded = (depth * 1000.0).round() / 1000.0;
    // -0.0 and tiny negatives must not render as "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let s = format!("{rounded:.3}");
        s.trim_end_matches('0').to_string()
    }
}

// ============================================================================
// Edges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Same volume, adjacent intervals
    Vertical,
    /// Different volumes, same interval, across a barrier
    Radial,
    /// Topmost volume node to SURFACE
    Termination,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Vertical => "vertical",
            EdgeKind::Radial => "radial",
            EdgeKind::Termination => "termination",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSubKind {
    /// User-declared breakout connection
    Scenario,
}

/// Traversal cost of an edge. Only two finite costs exist; an impassable edge
/// carries no cost at all (`Option::None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum BarrierCost {
    /// Unobstructed
    Open,
    /// One barrier must fail to pass
    Barrier,
}

impl BarrierCost {
    pub fn weight(self) -> u32 {
        match self {
            BarrierCost::Open => 0,
            BarrierCost::Barrier => 1,
        }
    }
}

impl From<BarrierCost> for u8 {
    fn from(cost: BarrierCost) -> Self {
        match cost {
            BarrierCost::Open => 0,
            BarrierCost::Barrier => 1,
        }
    }
}

impl TryFrom<u8> for BarrierCost {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BarrierCost::Open),
            1 => Ok(BarrierCost::Barrier),
            other => Err(format!("edge cost must be 0 or 1, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    Open,
    BarrierIntact,
    Impassable,
}

impl EdgeState {
    pub fn from_cost(cost: Option<BarrierCost>) -> Self {
        match cost {
            Some(BarrierCost::Open) => EdgeState::Open,
            Some(BarrierCost::Barrier) => EdgeState::BarrierIntact,
            None => EdgeState::Impassable,
        }
    }
}

/// A row consulted while costing an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentContributor {
    pub row_id: String,
    pub equipment_type: String,
    /// Cost this row alone imposes (1 = holding, 0 = breached)
    pub cost: Option<BarrierCost>,
    pub state: String,
    /// Barrier function the row performs at this edge
    pub function_key: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonDetails {
    pub equipment_contributors: Vec<EquipmentContributor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_index: Option<usize>,
}

/// Machine-checkable explanation of an edge cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeReason {
    pub rule_id: String,
    pub summary: String,
    pub details: ReasonDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub edge_id: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_kind: Option<EdgeSubKind>,
    pub from: String,
    pub to: String,
    pub cost: Option<BarrierCost>,
    pub state: EdgeState,
    pub reason: EdgeReason,
}

impl Edge {
    pub fn is_scenario(&self) -> bool {
        self.sub_kind == Some(EdgeSubKind::Scenario)
    }

    pub fn is_traversable(&self) -> bool {
        self.cost.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_deterministic() {
        assert_eq!(node_id(NodeKind::AnnulusA, 0.0, 100.0), "node:ANNULUS_A:0:100");
        assert_eq!(
            node_id(NodeKind::TubingInner, 1250.5, 1300.125),
            "node:TUBING_INNER:1250.5:1300.125"
        );
        assert_eq!(Node::surface().node_id, SURFACE_NODE_ID);
    }

    #[test]
    fn format_depth_trims_noise() {
        assert_eq!(format_depth(100.0), "100");
        assert_eq!(format_depth(100.10), "100.1");
        assert_eq!(format_depth(99.999_999), "100");
    }

    #[test]
    fn negative_zero_depth_has_no_sign() {
        assert_eq!(format_depth(-0.0), "0");
        assert_eq!(format_depth(-0.000_1), "0");
        assert_eq!(node_id(NodeKind::TubingInner, -0.0, 50.0), "node:TUBING_INNER:0:50");
        assert_eq!(format_depth(-12.5), "-12.5");
    }

    #[test]
    fn barrier_cost_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Some(BarrierCost::Barrier)).unwrap(), "1");
        assert_eq!(serde_json::to_string(&None::<BarrierCost>).unwrap(), "null");
        let parsed: BarrierCost = serde_json::from_str("0").unwrap();
        assert_eq!(parsed, BarrierCost::Open);
        assert!(serde_json::from_str::<BarrierCost>("2").is_err());
    }

    #[test]
    fn annulus_slots_map_to_kinds() {
        assert_eq!(NodeKind::annulus(0), Some(NodeKind::AnnulusA));
        assert_eq!(NodeKind::annulus(3), Some(NodeKind::AnnulusD));
        assert_eq!(NodeKind::annulus(4), None);
    }
}
