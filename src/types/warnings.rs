//! Validation warning catalog
//!
//! Input defects never abort a build. They are downgraded to one of these
//! warnings, attached to the offending row where there is one, and the
//! affected computation continues with a conservative default.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed catalog of warning codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    InvalidInterval,
    OverlappingInterval,
    MarkerMissingDepthRange,
    MarkerMissingVolume,
    MarkerNoResolvableInterval,
    FluidMissingDepthRange,
    FluidMissingVolume,
    FluidNoResolvableInterval,
    ScenarioBreakoutMissingVolumePair,
    ScenarioBreakoutMissingDepthRange,
    ScenarioBreakoutNoResolvableInterval,
    EquipmentMissingDepthRange,
    EquipmentHostNotFound,
    EquipmentNoResolvableInterval,
    IllustrativeFluidSourceModeEnabled,
    IllustrativeFluidSourceSuppressed,
    ExplicitScenarioSourceModeActive,
    NoSourcesResolved,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::InvalidInterval => "INVALID_INTERVAL",
            WarningCode::OverlappingInterval => "OVERLAPPING_INTERVAL",
            WarningCode::MarkerMissingDepthRange => "MARKER_MISSING_DEPTH_RANGE",
            WarningCode::MarkerMissingVolume => "MARKER_MISSING_VOLUME",
            WarningCode::MarkerNoResolvableInterval => "MARKER_NO_RESOLVABLE_INTERVAL",
            WarningCode::FluidMissingDepthRange => "FLUID_MISSING_DEPTH_RANGE",
            WarningCode::FluidMissingVolume => "FLUID_MISSING_VOLUME",
            WarningCode::FluidNoResolvableInterval => "FLUID_NO_RESOLVABLE_INTERVAL",
            WarningCode::ScenarioBreakoutMissingVolumePair => {
                "SCENARIO_BREAKOUT_MISSING_VOLUME_PAIR"
            }
            WarningCode::ScenarioBreakoutMissingDepthRange => {
                "SCENARIO_BREAKOUT_MISSING_DEPTH_RANGE"
            }
            WarningCode::ScenarioBreakoutNoResolvableInterval => {
                "SCENARIO_BREAKOUT_NO_RESOLVABLE_INTERVAL"
            }
            WarningCode::EquipmentMissingDepthRange => "EQUIPMENT_MISSING_DEPTH_RANGE",
            WarningCode::EquipmentHostNotFound => "EQUIPMENT_HOST_NOT_FOUND",
            WarningCode::EquipmentNoResolvableInterval => "EQUIPMENT_NO_RESOLVABLE_INTERVAL",
            WarningCode::IllustrativeFluidSourceModeEnabled => {
                "ILLUSTRATIVE_FLUID_SOURCE_MODE_ENABLED"
            }
            WarningCode::IllustrativeFluidSourceSuppressed => {
                "ILLUSTRATIVE_FLUID_SOURCE_SUPPRESSED"
            }
            WarningCode::ExplicitScenarioSourceModeActive => {
                "EXPLICIT_SCENARIO_SOURCE_MODE_ACTIVE"
            }
            WarningCode::NoSourcesResolved => "NO_SOURCES_RESOLVED",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal finding about the input snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub message: String,
    /// Originating editable row, for round-tripping to the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    /// Offending fields on that row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ValidationWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            row_id: None,
            fields: Vec::new(),
        }
    }

    pub fn for_row(code: WarningCode, row_id: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            row_id: Some(row_id.to_string()),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref row) = self.row_id {
            write!(f, " (row {row})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_serializes_to_catalog_string() {
        let code = WarningCode::ExplicitScenarioSourceModeActive;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, format!("\"{}\"", code.as_str()));
    }

    #[test]
    fn warning_carries_row_and_fields() {
        let w = ValidationWarning::for_row(
            WarningCode::ScenarioBreakoutMissingDepthRange,
            "brk-1",
            "Breakout has no depth range",
        )
        .with_fields(&["top", "bottom"]);
        assert_eq!(w.row_id.as_deref(), Some("brk-1"));
        assert_eq!(w.fields, vec!["top", "bottom"]);
        assert!(w.to_string().contains("SCENARIO_BREAKOUT_MISSING_DEPTH_RANGE"));
    }
}
