//! Physics-provider boundary types
//!
//! Depth intervals and their radial layer stacks arrive already resolved from
//! the physics provider. Stacks are ordered innermost layer first, so the
//! index of a layer is also its radial position.

use serde::{Deserialize, Serialize};

/// Radial role of a layer within a cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    /// Bore of the innermost pipe
    Core,
    /// Open-hole bore where no pipe is run
    Wellbore,
    /// Steel wall of a casing, liner or tubing string
    Pipe,
    /// Space between two walls (or between a wall and the formation)
    Annulus,
}

/// Fill material of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Steel,
    Fluid,
    Gas,
    Cement,
    Plug,
    Rock,
    #[serde(other)]
    Other,
}

impl Material {
    /// Cement and mechanical plugs fill a volume with impermeable material.
    pub fn is_impermeable(self) -> bool {
        matches!(self, Material::Cement | Material::Plug)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Steel => "steel",
            Material::Fluid => "fluid",
            Material::Gas => "gas",
            Material::Cement => "cement",
            Material::Plug => "plug",
            Material::Rock => "rock",
            Material::Other => "other",
        }
    }
}

/// Kind of editable row a layer was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRowKind {
    Casing,
    Liner,
    Tubing,
    Cement,
    Fluid,
    Equipment,
    Formation,
}

/// Back-reference from a layer to the row that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSource {
    pub row_id: String,
    pub row_kind: LayerRowKind,
}

/// One radial layer of the cross-section at a given depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub role: LayerRole,
    pub material: Material,
    /// Inner radius (in)
    pub inner_radius: f64,
    /// Outer radius (in)
    pub outer_radius: f64,
    #[serde(default)]
    pub is_formation: bool,
    /// Annulus slot, 0 = A … 3 = D
    #[serde(default)]
    pub slot_index: Option<u8>,
    #[serde(default)]
    pub source: Option<LayerSource>,
}

impl Layer {
    pub fn thickness(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn source_row_id(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.row_id.as_str())
    }
}

/// A depth interval produced by the physics provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthInterval {
    /// Top depth (ft MD)
    pub top: f64,
    /// Bottom depth (ft MD)
    pub bottom: f64,
    pub midpoint: f64,
    /// Why the provider split here (casing shoe, packer, cement top, ...)
    #[serde(default)]
    pub boundary_reasons: Vec<String>,
}

impl DepthInterval {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self {
            top,
            bottom,
            midpoint: (top + bottom) / 2.0,
            boundary_reasons: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.top.is_finite() && self.bottom.is_finite() && self.bottom > self.top
    }
}

/// An interval together with the radial stack resolved at its midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalStack {
    #[serde(flatten)]
    pub interval: DepthInterval,
    pub layers: Vec<Layer>,
}

/// The physics provider as seen from the topology core.
///
/// Implemented by whatever turns casing/tubing/equipment rows into depth
/// intervals and radial stacks; the core only consumes its output.
pub trait PhysicsProvider {
    /// Ordered, non-overlapping depth intervals.
    fn intervals(&self) -> Vec<DepthInterval>;

    /// Radial layer stack at a depth, innermost first.
    fn stack_at_depth(&self, depth: f64) -> Vec<Layer>;
}

/// Sample the provider's stack at every interval midpoint.
pub fn resolve_interval_stacks(provider: &dyn PhysicsProvider) -> Vec<IntervalStack> {
    provider
        .intervals()
        .into_iter()
        .map(|interval| {
            let layers = provider.stack_at_depth(interval.midpoint);
            IntervalStack { interval, layers }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoIntervalProvider;

    impl PhysicsProvider for TwoIntervalProvider {
        fn intervals(&self) -> Vec<DepthInterval> {
            vec![DepthInterval::new(0.0, 100.0), DepthInterval::new(100.0, 200.0)]
        }

        fn stack_at_depth(&self, depth: f64) -> Vec<Layer> {
            let material = if depth > 100.0 { Material::Cement } else { Material::Fluid };
            vec![Layer {
                role: LayerRole::Wellbore,
                material,
                inner_radius: 0.0,
                outer_radius: 4.25,
                is_formation: false,
                slot_index: None,
                source: None,
            }]
        }
    }

    #[test]
    fn stacks_are_sampled_at_midpoints() {
        let stacks = resolve_interval_stacks(&TwoIntervalProvider);
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].interval.midpoint, 50.0);
        assert_eq!(stacks[0].layers[0].material, Material::Fluid);
        assert_eq!(stacks[1].layers[0].material, Material::Cement);
    }

    #[test]
    fn unknown_material_deserializes_as_other() {
        let m: Material = serde_json::from_str("\"barite\"").unwrap();
        assert_eq!(m, Material::Other);
        assert!(!m.is_impermeable());
        assert!(Material::Plug.is_impermeable());
    }

    #[test]
    fn interval_validity() {
        assert!(DepthInterval::new(0.0, 1.0).is_valid());
        assert!(!DepthInterval::new(5.0, 5.0).is_valid());
        assert!(!DepthInterval::new(f64::NAN, 5.0).is_valid());
    }
}
