//! netlist-core
//!
//! Core library for hierarchical netlist editing.
//!
//! This crate defines the object model (blocks, instances, pins, nets), the
//! orchestration layer that keeps instances in step with their types, the
//! connectivity engine binding wiring graphs to logical nets, design
//! persistence, primitive libraries, and the snapshot history.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends.

pub mod db;
pub mod error;
pub mod library;
pub mod model;
pub mod persist;
pub mod project;
pub mod report;
pub mod schematic;
pub mod wiring;

pub use error::{NetlistError, NetlistResult, ObjectKind};
pub use project::{InstanceKey, NetlistProject};
pub use schematic::{Anchor, Schematic, WireEnd, Wired};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
