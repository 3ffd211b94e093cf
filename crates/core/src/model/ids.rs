//! Opaque id newtypes for model and wiring entities.
//!
//! Ids are allocated by a [`Registry`](crate::model::Registry) or a
//! [`WireGraph`](crate::wiring::WireGraph) and never reused within their scope,
//! so a renamed object keeps its id and every reference to it stays valid.

use serde::{Deserialize, Serialize};

/// Conversion to and from the raw index backing an id.
pub trait RawId: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_raw(index: u32) -> Self;
    fn as_raw(self) -> u32;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl RawId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Id of a Block, unique within a project.
    BlockId
);

define_id!(
    /// Id of an interface pin, unique within its Block.
    PinId
);

define_id!(
    /// Id of an Instance, unique within its parent Block.
    InstanceId
);

define_id!(
    /// Id of a Net, unique within its Block.
    NetId
);

define_id!(
    /// Id of a wire segment, unique within one block's wiring graph.
    SegmentId
);

define_id!(
    /// Id of a junction, unique within one block's wiring graph.
    JunctionId
);
