use std::fmt::Debug;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::Fatal,
    packet::PacketId,
    quantities::{Float, TimeSpan},
};

mod acc;
mod fair_route;
mod overflow;

pub use acc::Acc;
pub use fair_route::FairRoute;
pub use overflow::{AdmitAll, AvoidOverflow};

/// Protocol-specific observations about the receiver, gathered by the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceiverExtras {
    /// Buffer occupancy of the sending node.
    pub sender_length: usize,
    /// Entries gained per second by the receiver over its recent history.
    pub net_growth_rate: Float,
    /// Mean remaining TTL of the packets the receiver dropped recently.
    pub mean_drop_rttl: Option<TimeSpan>,
}

/// Snapshot of the receiving buffer at the start of a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceiverState {
    pub length: usize,
    /// Zero means unbounded.
    pub capacity: usize,
    pub extras: ReceiverExtras,
}

impl ReceiverState {
    /// Free slots, or `None` for an unbounded buffer.
    #[must_use]
    pub const fn free(&self) -> Option<usize> {
        if self.capacity == 0 {
            None
        } else {
            Some(self.capacity.saturating_sub(self.length))
        }
    }
}

/// Per-packet inputs to an admission decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketInfo {
    pub packet: PacketId,
    /// `None` when packets never expire.
    pub remaining_ttl: Option<TimeSpan>,
    pub sender_utility: Float,
    pub receiver_utility: Float,
}

/// Decides which of the scheduled packets may cross a contact.
///
/// A contact goes through [`CongestionControl::record_receiver_state`],
/// any number of [`CongestionControl::add_packet_info`] calls and finally
/// [`CongestionControl::filter_packets`], which leaves the policy ready for
/// the next contact whatever its outcome.
pub trait CongestionControl: Debug {
    fn record_receiver_state(&mut self, state: ReceiverState);

    fn add_packet_info(&mut self, info: PacketInfo);

    /// The admitted packets in candidate order, or `None` if none are.
    fn filter_packets(&mut self, candidates: &[PacketId]) -> Result<Option<Vec<PacketId>>, Fatal>;
}

/// Everything a policy accumulated for one contact.
#[derive(Debug)]
pub struct Contact {
    pub receiver: ReceiverState,
    pub infos: FxHashMap<PacketId, PacketInfo>,
    /// Candidates with repeats removed, first occurrence kept.
    pub candidates: Vec<PacketId>,
}

#[derive(Debug, Default)]
pub struct ContactState {
    receiver: Option<ReceiverState>,
    infos: FxHashMap<PacketId, PacketInfo>,
}

impl ContactState {
    pub fn record(&mut self, state: ReceiverState) {
        self.receiver = Some(state);
    }

    pub fn add(&mut self, info: PacketInfo) {
        self.infos.insert(info.packet, info);
    }

    /// Hands over the accumulated state and resets it.
    ///
    /// Returns `None` when there is nothing to filter.
    pub fn begin_filter(&mut self, candidates: &[PacketId]) -> Result<Option<Contact>, Fatal> {
        let receiver = self.receiver.take();
        let infos = std::mem::take(&mut self.infos);
        match receiver {
            None if !infos.is_empty() => Err(Fatal::MissingReceiverState),
            _ if candidates.is_empty() => Ok(None),
            None => Err(Fatal::MissingReceiverState),
            Some(receiver) => Ok(Some(Contact {
                receiver,
                infos,
                candidates: candidates.iter().copied().unique().collect(),
            })),
        }
    }
}

pub(crate) fn admitted(packets: Vec<PacketId>) -> Option<Vec<PacketId>> {
    (!packets.is_empty()).then_some(packets)
}

/// Registry of the available admission policies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CongestionControlKind {
    None,
    AvoidOverflow,
    FairRoute,
    Acc,
}

impl CongestionControlKind {
    pub const ALL: [CongestionControlKind; 4] = [
        CongestionControlKind::None,
        CongestionControlKind::AvoidOverflow,
        CongestionControlKind::FairRoute,
        CongestionControlKind::Acc,
    ];

    #[must_use]
    pub fn build(self) -> Box<dyn CongestionControl> {
        match self {
            CongestionControlKind::None => Box::<AdmitAll>::default(),
            CongestionControlKind::AvoidOverflow => Box::<AvoidOverflow>::default(),
            CongestionControlKind::FairRoute => Box::<FairRoute>::default(),
            CongestionControlKind::Acc => Box::<Acc>::default(),
        }
    }
}
