//! Test fixtures: a tubing-in-casing completion with open hole outside.

use crate::types::{
    BreakoutRow, DepthInterval, EquipmentRow, EquipmentState, EquipmentType, IntervalStack, Layer,
    LayerRole, LayerRowKind, LayerSource, Material, MarkerRow, MarkerType, TubularKind, TubularRow,
    TubularState, VolumeRef, WellSnapshot,
};

pub fn layer(role: LayerRole, material: Material, inner: f64, outer: f64) -> Layer {
    Layer {
        role,
        material,
        inner_radius: inner,
        outer_radius: outer,
        is_formation: false,
        slot_index: None,
        source: None,
    }
}

pub fn pipe(row_id: &str, kind: LayerRowKind, inner: f64, outer: f64) -> Layer {
    Layer {
        source: Some(LayerSource {
            row_id: row_id.to_string(),
            row_kind: kind,
        }),
        ..layer(LayerRole::Pipe, Material::Steel, inner, outer)
    }
}

pub fn annulus(slot: u8, material: Material, inner: f64, outer: f64) -> Layer {
    Layer {
        slot_index: Some(slot),
        ..layer(LayerRole::Annulus, material, inner, outer)
    }
}

pub fn open_hole(slot: u8, inner: f64, outer: f64) -> Layer {
    Layer {
        is_formation: true,
        ..annulus(slot, Material::Fluid, inner, outer)
    }
}

/// Bore, tubing `tbg`, annulus A, casing `csg`, formation outside.
pub fn completion_layers() -> Vec<Layer> {
    vec![
        layer(LayerRole::Core, Material::Fluid, 0.0, 1.5),
        pipe("tbg", LayerRowKind::Tubing, 1.5, 1.75),
        annulus(0, Material::Fluid, 1.75, 3.0),
        pipe("csg", LayerRowKind::Casing, 3.0, 3.5),
        open_hole(1, 3.5, 6.0),
    ]
}

/// Contiguous intervals between consecutive depths, all with the same layers.
pub fn uniform_stacks(depths: &[f64], layers: &[Layer]) -> Vec<IntervalStack> {
    depths
        .windows(2)
        .map(|w| IntervalStack {
            interval: DepthInterval::new(w[0], w[1]),
            layers: layers.to_vec(),
        })
        .collect()
}

pub fn tubular(row_id: &str, kind: TubularKind, state: TubularState) -> TubularRow {
    TubularRow {
        row_id: row_id.to_string(),
        kind,
        label: None,
        top: Some(0.0),
        bottom: None,
        state,
        failure_top: None,
        failure_bottom: None,
    }
}

pub fn equipment(
    row_id: &str,
    equipment_type: EquipmentType,
    host: &str,
    depth: f64,
    state: EquipmentState,
) -> EquipmentRow {
    EquipmentRow {
        row_id: row_id.to_string(),
        equipment_type,
        host_row_id: Some(host.to_string()),
        top: Some(depth),
        bottom: Some(depth),
        state,
    }
}

pub fn marker(row_id: &str, volume: Option<VolumeRef>, top: f64, bottom: f64) -> MarkerRow {
    MarkerRow {
        row_id: row_id.to_string(),
        marker_type: MarkerType::Perforation,
        volume,
        top: Some(top),
        bottom: Some(bottom),
    }
}

pub fn breakout(row_id: &str, from: VolumeRef, to: VolumeRef, top: f64, bottom: f64) -> BreakoutRow {
    BreakoutRow {
        row_id: row_id.to_string(),
        from_volume: Some(from),
        to_volume: Some(to),
        top: Some(top),
        bottom: Some(bottom),
        label: None,
    }
}

/// Same completion with the casing cemented to surface instead of open hole.
pub fn cemented_layers() -> Vec<Layer> {
    let mut layers = completion_layers();
    layers[4] = Layer {
        source: Some(LayerSource {
            row_id: "cmt-1".to_string(),
            row_kind: LayerRowKind::Cement,
        }),
        ..annulus(1, Material::Cement, 3.5, 6.0)
    };
    layers
}

/// Three intervals (0-1000-2000-3000): casing cemented down to 2000, open
/// hole below, intact tubing and casing, perforated at the bottom.
pub fn intact_well() -> WellSnapshot {
    let mut intervals = uniform_stacks(&[0.0, 1000.0, 2000.0], &cemented_layers());
    intervals.extend(uniform_stacks(&[2000.0, 3000.0], &completion_layers()));
    WellSnapshot {
        intervals,
        tubulars: vec![
            tubular("tbg", TubularKind::Tubing, TubularState::Intact),
            tubular("csg", TubularKind::Casing, TubularState::Intact),
        ],
        markers: vec![marker("perf-1", None, 2500.0, 2600.0)],
        ..WellSnapshot::default()
    }
}
