//! Shared data structures for well barrier topology analysis
//!
//! This module defines the core types for the topology pipeline:
//! - Physics boundary: DepthInterval, Layer, IntervalStack, PhysicsProvider
//! - Editable rows: TubularRow, EquipmentRow, MarkerRow, FluidRow, BreakoutRow
//! - Graph: Node, Edge, EdgeReason, EquipmentContributor
//! - Output: TopologyResult, BarrierEnvelope, SourceEntity
//! - Diagnostics: ValidationWarning, WarningCode

mod graph;
mod physics;
mod result;
mod rows;
mod warnings;

pub use graph::*;
pub use physics::*;
pub use result::*;
pub use rows::*;
pub use warnings::*;
