use std::fmt::Display;

use serde::{Deserialize, Serialize};

mod entry;
mod fields;
mod record;
mod store;

pub use entry::{EncodedEntry, Expiry, PacketEntry};
pub use fields::{NativeFields, UTILITY_EPSILON};
pub use record::{PacketRecord, RecordKind, RecordLog};
pub use store::{PacketStore, PositionIndex, StoreCounters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketId(pub u64);

impl Display for PacketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}
