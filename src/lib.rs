//! Well barrier topology
//!
//! Turns a well's radial cross-sections and editable rows (tubulars,
//! equipment, markers, fluids, breakouts) into a typed graph of volumes and
//! barriers, then answers three questions about it:
//!
//! - where can flow go right now without anything failing (active flow)
//! - how many barriers must fail before flow reaches surface (0-1 BFS)
//! - do the two cheapest failure routes rely on the same physical barriers
//!   (envelope independence heuristic)
//!
//! ## Layout
//!
//! - **types**: snapshot rows, graph, result and warning types
//! - **topology**: node/edge builders, source resolver, path algorithms,
//!   envelope evaluator, orchestrator and inspector
//! - **worker**: request/response envelopes, worker actor, client, and
//!   latest-request-wins synchronization
//! - **config**: TOML tolerances and policy defaults

pub mod config;
pub mod topology;
pub mod types;
pub mod worker;

pub use config::TopologyConfig;

pub use topology::{
    BuildRequest, InspectorScope, TopologyError, TopologyInspector, build_topology_model,
};

pub use types::{
    BarrierCost, BarrierEnvelope, Edge, EdgeKind, IndependenceHeuristic, Node, NodeKind,
    PhysicsProvider, SnapshotRow, TopologyResult, TopologySummary, ValidationWarning,
    WarningCode, WellSnapshot,
};

pub use worker::{
    ResultSynchronizer, SyncOutcome, WorkerClient, WorkerError, WorkerRequest, WorkerResponse,
};
