use derive_more::Display;

use crate::packet::{NodeId, PacketId};

/// A condition the simulation cannot recover from.
///
/// These indicate a bug in the calling protocol or an impossible input
/// rather than a runtime condition. Operations that report one leave the
/// state they were called on untouched, so the run can be aborted cleanly.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Fatal {
    #[display(fmt = "packet {} is not in the buffer", _0)]
    PacketNotFound(PacketId),
    #[display(fmt = "packet {} is already in the buffer", _0)]
    DuplicatePacket(PacketId),
    #[display(fmt = "an encoded packet combining {} and {} already exists", _0, _1)]
    DuplicateEncoding(PacketId, PacketId),
    #[display(fmt = "packets {} and {} cannot be encoded together", _0, _1)]
    InvalidEncoding(PacketId, PacketId),
    #[display(fmt = "eviction requested from an empty buffer")]
    EmptyBufferEviction,
    #[display(fmt = "packets {} and {} have identical sort keys", _0, _1)]
    TiedSortKeys(PacketId, PacketId),
    #[display(fmt = "utility sum for packet {} is zero", _0)]
    ZeroDenominator(PacketId),
    #[display(fmt = "no utility was supplied for packet {}", _0)]
    MissingUtility(PacketId),
    #[display(fmt = "packet information supplied without the receiver state")]
    MissingReceiverState,
    #[display(fmt = "no admission information was supplied for packet {}", _0)]
    MissingPacketInfo(PacketId),
    #[display(
        fmt = "packet {} holds {} replicas but {} were requested",
        packet,
        owned,
        requested
    )]
    ReplicaOverflow {
        packet: PacketId,
        owned: u32,
        requested: u32,
    },
    #[display(fmt = "event scheduled in the past")]
    EventInPast,
    #[display(fmt = "node {} does not exist", _0)]
    UnknownNode(NodeId),
}

impl std::error::Error for Fatal {}
