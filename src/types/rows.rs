//! Editable row variants and the well state snapshot
//!
//! Rows arrive from the editors with optional fields. Each domain gets its own
//! closed variant; depth ranges are validated once through [`DepthRange`] and
//! everything downstream works with the validated form.

use serde::{Deserialize, Serialize};

use super::graph::VolumeRef;
use super::physics::{IntervalStack, PhysicsProvider, resolve_interval_stacks};

// ============================================================================
// Depth ranges
// ============================================================================

/// A validated `[top, bottom]` depth range. `top == bottom` is a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub top: f64,
    pub bottom: f64,
}

impl DepthRange {
    /// Validate an optional pair of depths from a row.
    pub fn from_optional(top: Option<f64>, bottom: Option<f64>) -> Option<Self> {
        match (top, bottom) {
            (Some(t), Some(b)) if t.is_finite() && b.is_finite() && b >= t => {
                Some(Self { top: t, bottom: b })
            }
            // A single depth is treated as a point
            (Some(t), None) | (None, Some(t)) if t.is_finite() => Some(Self { top: t, bottom: t }),
            _ => None,
        }
    }

    pub fn is_point(&self) -> bool {
        self.bottom == self.top
    }

    /// Whether this range touches the half-open interval `[top, bottom)`.
    pub fn overlaps(&self, top: f64, bottom: f64, tolerance: f64) -> bool {
        if self.is_point() {
            self.top >= top - tolerance && self.top < bottom - tolerance
        } else {
            self.top < bottom - tolerance && self.bottom > top + tolerance
        }
    }

    pub fn contains(&self, depth: f64, tolerance: f64) -> bool {
        depth >= self.top - tolerance && depth <= self.bottom + tolerance
    }
}

// ============================================================================
// Tubulars
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TubularKind {
    Casing,
    Liner,
    Tubing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TubularState {
    Intact,
    Leaking,
    /// Connection failure: the string is parted at a joint
    Parted,
    #[default]
    Unknown,
}

impl TubularState {
    pub fn as_str(self) -> &'static str {
        match self {
            TubularState::Intact => "intact",
            TubularState::Leaking => "leaking",
            TubularState::Parted => "parted",
            TubularState::Unknown => "unknown",
        }
    }
}

/// A casing, liner or tubing string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TubularRow {
    pub row_id: String,
    pub kind: TubularKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub state: TubularState,
    /// Where a leak/parting is located; whole string when absent
    #[serde(default)]
    pub failure_top: Option<f64>,
    #[serde(default)]
    pub failure_bottom: Option<f64>,
}

impl TubularRow {
    pub fn failure_range(&self) -> Option<DepthRange> {
        DepthRange::from_optional(self.failure_top, self.failure_bottom)
    }
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Packer,
    HangerSeal,
    BridgePlug,
    CementPlug,
    SafetyValve,
    SlidingSleeve,
    GasLiftValve,
    Perforations,
    /// Fish, collapse or anything else that physically closes a bore
    Obstruction,
}

/// Barrier function an equipment row performs relative to its host pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentFunction {
    /// Seals the annulus just outside the host pipe
    AnnularSeal,
    /// Seals the bore of the host pipe
    BoreSeal,
    /// An opening (or potential opening) through the host pipe wall
    WallPort,
    /// Closes the bore of the host pipe outright
    Obstruction,
}

impl EquipmentType {
    pub fn function(self) -> EquipmentFunction {
        match self {
            EquipmentType::Packer | EquipmentType::HangerSeal => EquipmentFunction::AnnularSeal,
            EquipmentType::BridgePlug | EquipmentType::CementPlug | EquipmentType::SafetyValve => {
                EquipmentFunction::BoreSeal
            }
            EquipmentType::SlidingSleeve
            | EquipmentType::GasLiftValve
            | EquipmentType::Perforations => EquipmentFunction::WallPort,
            EquipmentType::Obstruction => EquipmentFunction::Obstruction,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentType::Packer => "packer",
            EquipmentType::HangerSeal => "hanger_seal",
            EquipmentType::BridgePlug => "bridge_plug",
            EquipmentType::CementPlug => "cement_plug",
            EquipmentType::SafetyValve => "safety_valve",
            EquipmentType::SlidingSleeve => "sliding_sleeve",
            EquipmentType::GasLiftValve => "gas_lift_valve",
            EquipmentType::Perforations => "perforations",
            EquipmentType::Obstruction => "obstruction",
        }
    }
}

impl EquipmentFunction {
    pub fn key(self) -> &'static str {
        match self {
            EquipmentFunction::AnnularSeal => "annular_seal",
            EquipmentFunction::BoreSeal => "bore_seal",
            EquipmentFunction::WallPort => "wall_port",
            EquipmentFunction::Obstruction => "obstruction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentState {
    Intact,
    Closed,
    Open,
    Failed,
    #[default]
    Unknown,
}

impl EquipmentState {
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentState::Intact => "intact",
            EquipmentState::Closed => "closed",
            EquipmentState::Open => "open",
            EquipmentState::Failed => "failed",
            EquipmentState::Unknown => "unknown",
        }
    }

    /// Whether the row still holds pressure. `Unknown` resolves per config.
    pub fn is_holding(self, unknown_is_intact: bool) -> bool {
        match self {
            EquipmentState::Intact | EquipmentState::Closed => true,
            EquipmentState::Open | EquipmentState::Failed => false,
            EquipmentState::Unknown => unknown_is_intact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRow {
    pub row_id: String,
    pub equipment_type: EquipmentType,
    /// Tubular row the equipment is run on
    #[serde(default)]
    pub host_row_id: Option<String>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub state: EquipmentState,
}

impl EquipmentRow {
    pub fn depth_range(&self) -> Option<DepthRange> {
        DepthRange::from_optional(self.top, self.bottom)
    }
}

// ============================================================================
// Markers, fluids, breakouts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    Perforation,
    Leak,
}

/// A perforation or leak marker; the default source of flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRow {
    pub row_id: String,
    pub marker_type: MarkerType,
    /// Perforations default to the formation annulus when absent
    #[serde(default)]
    pub volume: Option<VolumeRef>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
}

impl MarkerRow {
    pub fn depth_range(&self) -> Option<DepthRange> {
        DepthRange::from_optional(self.top, self.bottom)
    }

    pub fn resolved_volume(&self) -> Option<VolumeRef> {
        match (self.volume, self.marker_type) {
            (Some(v), _) => Some(v),
            (None, MarkerType::Perforation) => Some(VolumeRef::Formation),
            (None, MarkerType::Leak) => None,
        }
    }
}

/// A fluid column in a volume; only a source in illustrative mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidRow {
    pub row_id: String,
    pub fluid: String,
    #[serde(default)]
    pub volume: Option<VolumeRef>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl FluidRow {
    pub fn depth_range(&self) -> Option<DepthRange> {
        DepthRange::from_optional(self.top, self.bottom)
    }
}

/// A user-declared breakout: flow enters `from_volume` and communicates with
/// `to_volume` over the row's depth range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutRow {
    pub row_id: String,
    #[serde(default)]
    pub from_volume: Option<VolumeRef>,
    #[serde(default)]
    pub to_volume: Option<VolumeRef>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl BreakoutRow {
    pub fn depth_range(&self) -> Option<DepthRange> {
        DepthRange::from_optional(self.top, self.bottom)
    }

    /// Both named volumes, when present and distinct.
    pub fn volume_pair(&self) -> Option<(VolumeRef, VolumeRef)> {
        match (self.from_volume, self.to_volume) {
            (Some(from), Some(to)) if from != to => Some((from, to)),
            _ => None,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// One editable row, tagged by domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum SnapshotRow {
    Tubular(TubularRow),
    Equipment(EquipmentRow),
    Marker(MarkerRow),
    Fluid(FluidRow),
    Breakout(BreakoutRow),
}

/// Everything the topology core needs about a well at one moment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellSnapshot {
    pub intervals: Vec<IntervalStack>,
    #[serde(default)]
    pub tubulars: Vec<TubularRow>,
    #[serde(default)]
    pub equipment: Vec<EquipmentRow>,
    #[serde(default)]
    pub markers: Vec<MarkerRow>,
    #[serde(default)]
    pub fluids: Vec<FluidRow>,
    #[serde(default)]
    pub breakouts: Vec<BreakoutRow>,
    /// Opt-in, non-engineering source inference from fluid rows
    #[serde(default)]
    pub illustrative_fluid_sources: bool,
}

impl WellSnapshot {
    /// Assemble a snapshot from resolved stacks and a mixed list of rows.
    pub fn from_rows(
        intervals: Vec<IntervalStack>,
        rows: Vec<SnapshotRow>,
        illustrative_fluid_sources: bool,
    ) -> Self {
        let mut snapshot = Self {
            intervals,
            illustrative_fluid_sources,
            ..Self::default()
        };
        for row in rows {
            match row {
                SnapshotRow::Tubular(r) => snapshot.tubulars.push(r),
                SnapshotRow::Equipment(r) => snapshot.equipment.push(r),
                SnapshotRow::Marker(r) => snapshot.markers.push(r),
                SnapshotRow::Fluid(r) => snapshot.fluids.push(r),
                SnapshotRow::Breakout(r) => snapshot.breakouts.push(r),
            }
        }
        snapshot
    }

    /// Sample a physics provider and attach rows.
    pub fn from_provider(
        provider: &dyn PhysicsProvider,
        rows: Vec<SnapshotRow>,
        illustrative_fluid_sources: bool,
    ) -> Self {
        Self::from_rows(resolve_interval_stacks(provider), rows, illustrative_fluid_sources)
    }

    pub fn has_scenario_rows(&self) -> bool {
        !self.breakouts.is_empty()
    }
}
