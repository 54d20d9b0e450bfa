use std::fmt::Display;

use crate::{
    packet::{NodeId, PacketId},
    quantities::Time,
};

mod queue;

pub use queue::EventQueue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    ContactUp {
        a: NodeId,
        b: NodeId,
    },
    ContactDown {
        a: NodeId,
        b: NodeId,
    },
    /// Completion of a packet transfer; `valid` is cleared if the link
    /// goes down first.
    Transmission {
        sender: NodeId,
        receiver: NodeId,
        packet: PacketId,
        valid: bool,
    },
    PacketGeneration {
        source: NodeId,
        destination: NodeId,
        packet: PacketId,
        valid: bool,
    },
    /// Signals that the contact source should be consulted again.
    CheckPoint,
}

impl EventKind {
    /// Whether this is a pending transfer between `a` and `b`, in either direction.
    #[must_use]
    pub fn is_transfer_between(&self, a: NodeId, b: NodeId) -> bool {
        matches!(
            self,
            EventKind::Transmission { sender, receiver, .. }
                if (*sender, *receiver) == (a, b) || (*sender, *receiver) == (b, a)
        )
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::ContactUp { a, b } => write!(f, "contact up {a}-{b}"),
            EventKind::ContactDown { a, b } => write!(f, "contact down {a}-{b}"),
            EventKind::Transmission {
                sender,
                receiver,
                packet,
                valid,
            } => {
                write!(f, "transmission of {packet} {sender}->{receiver}")?;
                if !valid {
                    write!(f, " (aborted)")?;
                }
                Ok(())
            }
            EventKind::PacketGeneration {
                source,
                destination,
                packet,
                ..
            } => write!(f, "generation of {packet} {source}->{destination}"),
            EventKind::CheckPoint => write!(f, "checkpoint"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub time: Time,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub const fn new(time: Time, kind: EventKind) -> Event {
        Event { time, kind }
    }
}
