//! Hierarchical netlist object model: blocks, instances, pins, and nets.
//!
//! - [`Block`]: named container of interface pins, instances, and nets.
//! - [`Instance`]: typed placement of a Block whose refs mirror its type's pins.
//! - [`Pin`] / [`PinRef`]: interface terminal and its per-context binding.
//! - [`Net`]: ordered set of connected terminals scoped to one Block.
//!
//! Cross references are ids, never owning pointers: a `PinRef` stores the id of
//! its net, a `Net` stores [`Terminal`] values.

mod block;
mod ids;
mod instance;
mod net;
mod pin;
mod registry;

pub use block::Block;
pub use ids::{BlockId, InstanceId, JunctionId, NetId, PinId, RawId, SegmentId};
pub use instance::{Instance, PinUpdate};
pub use net::Net;
pub use pin::{check_name, Pin, PinPath, PinRef, Terminal, PATH_SEPARATOR};
pub use registry::{Named, Registry};
