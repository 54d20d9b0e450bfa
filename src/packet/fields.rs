use crate::quantities::{Float, Time, TimeSpan};

use super::{NodeId, PacketId};

/// Utilities closer than this are considered equal.
pub const UTILITY_EPSILON: Float = 1e-9;

/// Everything a node knows about one native packet it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFields {
    pub id: PacketId,
    pub source: NodeId,
    pub destination: NodeId,
    pub created: Time,
    pub inserted: Time,
    pub hops: u32,
    pub prev_hop: Option<NodeId>,
    pub replicas: u32,
    /// Best utility ever observed for the destination, one slot per metric.
    pub thresholds: Vec<Float>,
    pub forwarded: bool,
    pub previous_hops: Vec<NodeId>,
    pub forwarders: Vec<NodeId>,
}

impl NativeFields {
    #[must_use]
    pub fn new(id: PacketId, source: NodeId, destination: NodeId, created: Time) -> NativeFields {
        NativeFields {
            id,
            source,
            destination,
            created,
            inserted: created,
            hops: 0,
            prev_hop: None,
            replicas: 1,
            thresholds: Vec::new(),
            forwarded: false,
            previous_hops: Vec::new(),
            forwarders: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hops(mut self, hops: u32) -> NativeFields {
        self.hops = hops;
        self
    }

    #[must_use]
    pub fn with_replicas(mut self, replicas: u32) -> NativeFields {
        self.replicas = replicas;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Vec<Float>) -> NativeFields {
        self.thresholds = thresholds;
        self
    }

    /// The copy a neighbour receives when this packet is handed over by `via`.
    #[must_use]
    pub fn relayed_by(&self, via: NodeId) -> NativeFields {
        let mut previous_hops = self.previous_hops.clone();
        if !previous_hops.contains(&via) {
            previous_hops.push(via);
        }
        NativeFields {
            hops: self.hops + 1,
            prev_hop: Some(via),
            forwarded: false,
            previous_hops,
            forwarders: Vec::new(),
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn is_relayed(&self) -> bool {
        self.hops > 0
    }

    #[must_use]
    pub fn age(&self, now: Time) -> TimeSpan {
        now - self.created
    }

    /// Age strictly beyond the lifetime; a zero lifetime never expires.
    #[must_use]
    pub fn is_expired(&self, now: Time, ttl: TimeSpan) -> bool {
        !ttl.is_zero() && self.age(now) > ttl
    }

    #[must_use]
    pub fn remaining_ttl(&self, now: Time, ttl: TimeSpan) -> Option<TimeSpan> {
        (!ttl.is_zero()).then(|| ttl - self.age(now))
    }

    /// Two packets can share a coded entry when each is headed to the
    /// other's source, so each endpoint can decode with its own packet.
    #[must_use]
    pub fn encodable_with(&self, other: &NativeFields) -> bool {
        self.id != other.id && self.source == other.destination && other.source == self.destination
    }

    #[must_use]
    pub fn threshold(&self, metric: usize) -> Float {
        self.thresholds.get(metric).copied().unwrap_or(0.)
    }

    /// Thresholds only ever grow, and only by more than [`UTILITY_EPSILON`].
    pub fn raise_threshold(&mut self, metric: usize, value: Float) -> bool {
        if self.thresholds.len() <= metric {
            self.thresholds.resize(metric + 1, 0.);
        }
        if value > self.thresholds[metric] + UTILITY_EPSILON {
            self.thresholds[metric] = value;
            true
        } else {
            false
        }
    }

    pub fn add_forwarder(&mut self, node: NodeId) {
        if !self.forwarders.contains(&node) {
            self.forwarders.push(node);
        }
    }

    pub fn add_previous_hop(&mut self, node: NodeId) {
        if !self.previous_hops.contains(&node) {
            self.previous_hops.push(node);
        }
    }
}
