use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    config::{BufferConfig, PolicyConfig},
    congestion::{CongestionControl, ReceiverExtras, ReceiverState},
    packet::{NodeId, PacketId, PacketStore},
    quantities::{Float, Time, TimeSpan},
    scheduling::SchedulingPolicy,
    util::logging::{Logger, NothingLogger},
};

/// Everything one simulated device owns.
#[derive(Debug)]
pub struct Node<L = NothingLogger> {
    pub id: NodeId,
    pub store: PacketStore<L>,
    pub scheduler: Box<dyn SchedulingPolicy>,
    pub congestion: Box<dyn CongestionControl>,
    encounters: FxHashMap<NodeId, u32>,
    received: FxHashSet<PacketId>,
}

impl<L> Node<L>
where
    L: Logger,
{
    #[must_use]
    pub fn new(id: NodeId, buffer: &BufferConfig, policies: &PolicyConfig, logger: L) -> Node<L> {
        let store = PacketStore::new(buffer.capacity, buffer.ttl, policies.dropping.build(), logger);
        Node {
            id,
            store: if buffer.recording {
                store.with_recording()
            } else {
                store
            },
            scheduler: policies.scheduling.build(),
            congestion: policies.congestion.build(),
            encounters: FxHashMap::default(),
            received: FxHashSet::default(),
        }
    }

    pub fn record_encounter(&mut self, other: NodeId) {
        *self.encounters.entry(other).or_default() += 1;
    }

    /// How well placed this node is to deliver to `destination`, in `[0, 1]`.
    #[must_use]
    pub fn utility_for(&self, destination: NodeId) -> Float {
        if destination == self.id {
            return 1.;
        }
        let met = Float::from(self.encounters.get(&destination).copied().unwrap_or(0));
        met / (met + 1.)
    }

    /// Accepts a packet addressed to this node, returning whether it is new.
    pub fn deliver(&mut self, packet: PacketId) -> bool {
        self.received.insert(packet)
    }

    #[must_use]
    pub fn has_received(&self, packet: PacketId) -> bool {
        self.received.contains(&packet)
    }

    /// What this node reveals about its buffer to a neighbour about to send.
    pub fn receiver_state(&mut self, now: Time, sender_length: usize, window: TimeSpan) -> ReceiverState {
        let length = self.store.len(now);
        let (net_growth_rate, mean_drop_rttl) = self.store.records().map_or((0., None), |records| {
            (
                records.net_growth_rate(now, window),
                records.mean_drop_rttl(now, window).ok(),
            )
        });
        ReceiverState {
            length,
            capacity: self.store.capacity(),
            extras: ReceiverExtras {
                sender_length,
                net_growth_rate,
                mean_drop_rttl,
            },
        }
    }
}
