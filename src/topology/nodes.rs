//! Node builder: turns interval stacks into volume nodes.
//!
//! ## Per-interval rules
//!
//! 1. **Bore** (`TUBING_INNER`) when a core/wellbore layer has positive
//!    thickness. `inner_channel` comes from the innermost steel pipe.
//! 2. **Annulus A–D** for each slot with positive thickness that is not a
//!    formation layer, or whose slot is allow-listed for formation layers.
//! 3. **Formation annulus** only when a formation-flagged layer exists at a
//!    slot no annulus node already represents, so one physical space never
//!    appears as two volume kinds.
//!
//! An interval with no positive-thickness layer yields no nodes at all.

use std::collections::HashMap;

use crate::config::NodeConfig;
use crate::types::{
    DepthInterval, InnerChannel, IntervalStack, Layer, LayerRole, LayerRowKind, Material, Node,
    NodeKind, NodeMeta,
};

/// A node's position in the radial stack of its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSlot {
    pub kind: NodeKind,
    /// Index of the volume's layer in the interval stack
    pub layer_index: usize,
    /// Index of the node in `NodeGraph::nodes`
    pub node_index: usize,
}

/// Nodes plus the lookups the edge builder needs.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    pub intervals: Vec<DepthInterval>,
    /// SURFACE first, then per interval in radial order
    pub nodes: Vec<Node>,
    /// `(interval_index, kind) → index into nodes`
    pub interval_node_by_kind: HashMap<(usize, NodeKind), usize>,
    /// Represented volumes per interval, innermost first
    pub interval_volumes: Vec<Vec<VolumeSlot>>,
}

impl NodeGraph {
    pub fn surface(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node_at(&self, interval_index: usize, kind: NodeKind) -> Option<&Node> {
        self.interval_node_by_kind
            .get(&(interval_index, kind))
            .map(|&i| &self.nodes[i])
    }
}

/// Build nodes for every interval. `stacks` must already be normalized
/// (sorted, non-overlapping, valid).
pub fn build_nodes(stacks: &[IntervalStack], config: &NodeConfig) -> NodeGraph {
    let mut graph = NodeGraph {
        intervals: Vec::with_capacity(stacks.len()),
        nodes: vec![Node::surface()],
        interval_node_by_kind: HashMap::new(),
        interval_volumes: Vec::with_capacity(stacks.len()),
    };

    for (interval_index, stack) in stacks.iter().enumerate() {
        let mut slots = Vec::new();
        for (kind, layer_index) in classify_volumes(&stack.layers, config) {
            let key = (interval_index, kind);
            if graph.interval_node_by_kind.contains_key(&key) {
                continue;
            }
            let layer = &stack.layers[layer_index];
            let meta = NodeMeta {
                is_blocked: layer.material.is_impermeable(),
                blocking_row_id: layer
                    .material
                    .is_impermeable()
                    .then(|| layer.source_row_id().map(str::to_string))
                    .flatten(),
                blocking_material: layer
                    .material
                    .is_impermeable()
                    .then(|| layer.material.as_str().to_string()),
                inner_channel: (kind == NodeKind::TubingInner)
                    .then(|| inner_channel(&stack.layers)),
                interval_index: Some(interval_index),
            };
            let node_index = graph.nodes.len();
            graph.nodes.push(Node::volume(
                kind,
                stack.interval.top,
                stack.interval.bottom,
                meta,
            ));
            graph.interval_node_by_kind.insert(key, node_index);
            slots.push(VolumeSlot {
                kind,
                layer_index,
                node_index,
            });
        }
        graph.intervals.push(stack.interval.clone());
        graph.interval_volumes.push(slots);
    }

    graph
}

/// Pick the layers that become nodes, returned innermost first.
fn classify_volumes(layers: &[Layer], config: &NodeConfig) -> Vec<(NodeKind, usize)> {
    let has_thickness = |l: &Layer| l.thickness() > config.min_layer_thickness;
    let mut volumes: Vec<(NodeKind, usize)> = Vec::new();

    if let Some(idx) = layers.iter().position(|l| {
        matches!(l.role, LayerRole::Core | LayerRole::Wellbore) && has_thickness(l)
    }) {
        volumes.push((NodeKind::TubingInner, idx));
    }

    let mut represented_slots: Vec<u8> = Vec::new();
    for (idx, layer) in layers.iter().enumerate() {
        if layer.role != LayerRole::Annulus || !has_thickness(layer) {
            continue;
        }
        let Some(slot) = layer.slot_index else { continue };
        let Some(kind) = NodeKind::annulus(slot) else { continue };
        if layer.is_formation && !config.formation_slot_allow_list.contains(&slot) {
            continue;
        }
        if represented_slots.contains(&slot) {
            continue;
        }
        represented_slots.push(slot);
        volumes.push((kind, idx));
    }

    let formation = layers.iter().position(|l| {
        l.is_formation
            && l.role == LayerRole::Annulus
            && has_thickness(l)
            && !l.slot_index.is_some_and(|s| represented_slots.contains(&s))
    });
    if let Some(idx) = formation {
        volumes.push((NodeKind::FormationAnnulus, idx));
    }

    volumes.sort_by_key(|&(_, idx)| idx);
    volumes
}

/// Classify the bore by its innermost steel pipe.
fn inner_channel(layers: &[Layer]) -> InnerChannel {
    let innermost_pipe = layers
        .iter()
        .find(|l| l.role == LayerRole::Pipe && l.material == Material::Steel);
    match innermost_pipe.and_then(|l| l.source.as_ref()).map(|s| s.row_kind) {
        Some(LayerRowKind::Tubing) => InnerChannel::Tubing,
        Some(_) => InnerChannel::Casing,
        None if innermost_pipe.is_some() => InnerChannel::Casing,
        None => InnerChannel::OpenWellbore,
    }
}
