//! Topology result: the single immutable output of a model build

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::graph::{Edge, EdgeReason, Node, NodeKind};
use super::warnings::ValidationWarning;

// ============================================================================
// Sources
// ============================================================================

/// Precedence tier that produced a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    MarkerDefault,
    FluidOptIn,
    ScenarioExplicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntity {
    pub node_id: String,
    pub kind: NodeKind,
    pub row_id: String,
    pub policy_mode: PolicyMode,
}

/// How the effective source set was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePolicy {
    /// Tiers whose sources made it into the result
    pub active_modes: Vec<PolicyMode>,
    pub illustrative_fluid_enabled: bool,
    pub explicit_scenario_active: bool,
    pub marker_candidate_count: usize,
    pub fluid_candidate_count: usize,
    pub scenario_candidate_count: usize,
}

// ============================================================================
// Barrier envelope
// ============================================================================

/// One physical barrier, deduplicated across every edge it contributes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarrierElement {
    /// `barrier:{row_id}:{function_key}`
    pub element_id: String,
    pub row_id: String,
    pub function_key: String,
    pub equipment_types: Vec<String>,
    pub edge_ids: Vec<String>,
}

pub fn barrier_element_id(row_id: &str, function_key: &str) -> String {
    format!("barrier:{row_id}:{function_key}")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopePath {
    pub cost: Option<u32>,
    pub path_edge_ids: Vec<String>,
    pub element_ids: Vec<String>,
    pub element_count: usize,
    pub elements: Vec<BarrierElement>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeOverlap {
    pub element_ids: Vec<String>,
    pub element_count: usize,
    /// overlap ÷ primary envelope size, 3 decimals
    pub ratio_to_primary: Option<f64>,
    /// overlap ÷ secondary envelope size, 3 decimals
    pub ratio_to_secondary: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndependenceHeuristic {
    /// The cheapest path is already open
    NoBarrierElements,
    /// No alternate route exists once the primary path is removed
    SinglePathOnly,
    /// Routes share no barrier element
    DistinctEnvelopes,
    /// Overlap covers the smaller envelope entirely
    FullySharedEnvelopes,
    PartialOverlapEnvelopes,
}

impl IndependenceHeuristic {
    pub fn as_str(self) -> &'static str {
        match self {
            IndependenceHeuristic::NoBarrierElements => "no_barrier_elements",
            IndependenceHeuristic::SinglePathOnly => "single_path_only",
            IndependenceHeuristic::DistinctEnvelopes => "distinct_envelopes",
            IndependenceHeuristic::FullySharedEnvelopes => "fully_shared_envelopes",
            IndependenceHeuristic::PartialOverlapEnvelopes => "partial_overlap_envelopes",
        }
    }
}

/// Comparison of the two cheapest failure routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarrierEnvelope {
    pub primary: EnvelopePath,
    pub secondary: EnvelopePath,
    pub overlap: EnvelopeOverlap,
    pub independence_heuristic: IndependenceHeuristic,
}

impl BarrierEnvelope {
    /// Look an element up in either envelope.
    pub fn element(&self, element_id: &str) -> Option<&BarrierElement> {
        self.primary
            .elements
            .iter()
            .chain(self.secondary.elements.iter())
            .find(|e| e.element_id == element_id)
    }
}

// ============================================================================
// Result
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyResult {
    pub request_id: u64,
    pub well_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub active_flow_node_ids: Vec<String>,
    pub min_failure_cost_to_surface: Option<u32>,
    pub min_cost_path_edge_ids: Vec<String>,
    pub spof_edge_ids: Vec<String>,
    pub barrier_envelope: BarrierEnvelope,
    pub source_entities: Vec<SourceEntity>,
    pub source_policy: SourcePolicy,
    pub edge_reasons: BTreeMap<String, EdgeReason>,
    pub validation_warnings: Vec<ValidationWarning>,
}

/// Compact view for log lines and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySummary {
    pub request_id: u64,
    pub well_id: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub source_count: usize,
    pub active_flow_count: usize,
    pub min_failure_cost_to_surface: Option<u32>,
    pub spof_count: usize,
    pub independence_heuristic: IndependenceHeuristic,
    pub warning_count: usize,
}

impl TopologyResult {
    pub fn summary(&self) -> TopologySummary {
        TopologySummary {
            request_id: self.request_id,
            well_id: self.well_id.clone(),
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            source_count: self.source_entities.len(),
            active_flow_count: self.active_flow_node_ids.len(),
            min_failure_cost_to_surface: self.min_failure_cost_to_surface,
            spof_count: self.spof_edge_ids.len(),
            independence_heuristic: self.barrier_envelope.independence_heuristic,
            warning_count: self.validation_warnings.len(),
        }
    }

    pub fn has_warning(&self, code: super::warnings::WarningCode) -> bool {
        self.validation_warnings.iter().any(|w| w.code == code)
    }
}
