use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    dropping::{DropStats, DroppingPolicy},
    error::Fatal,
    quantities::{Float, Time, TimeSpan},
    util::logging::{Logger, NothingLogger},
};

use super::{
    EncodedEntry, Expiry, NativeFields, NodeId, PacketEntry, PacketId, PacketRecord, RecordKind,
    RecordLog,
};

/// Buffer slot of every live packet, counted from the front. The halves of
/// an intact coded entry occupy consecutive slots.
pub type PositionIndex = FxHashMap<PacketId, usize>;

/// Entry-level totals; a coded entry counts once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounters {
    pub inserted: u64,
    pub dropped: u64,
    pub expired: u64,
    pub removed: u64,
}

/// The bounded packet buffer of a single node.
///
/// Every accessor takes the current simulation time and first discards
/// whatever has outlived the buffer's TTL, so expired packets are never
/// observable. A capacity of zero means unbounded and a TTL of zero means
/// packets never expire. When the buffer is full the dropping policy
/// evicts exactly one entry before an insertion goes ahead.
#[derive(Debug)]
pub struct PacketStore<L = NothingLogger> {
    capacity: usize,
    ttl: TimeSpan,
    entries: Vec<PacketEntry>,
    dropper: Box<dyn DroppingPolicy>,
    records: Option<RecordLog>,
    counters: StoreCounters,
    logger: L,
}

impl<L> PacketStore<L>
where
    L: Logger,
{
    #[must_use]
    pub fn new(
        capacity: usize,
        ttl: TimeSpan,
        dropper: Box<dyn DroppingPolicy>,
        logger: L,
    ) -> PacketStore<L> {
        PacketStore {
            capacity,
            ttl,
            entries: Vec::new(),
            dropper,
            records: None,
            counters: StoreCounters::default(),
            logger,
        }
    }

    /// Keeps a [`RecordLog`] of insertions, drops and expirations.
    #[must_use]
    pub fn with_recording(mut self) -> PacketStore<L> {
        self.records = Some(RecordLog::new());
        self
    }

    fn record(&self, now: Time, remaining_ttl: Option<TimeSpan>, kind: RecordKind) {
        if let Some(records) = &self.records {
            records.push(PacketRecord {
                time: now,
                remaining_ttl,
                kind,
            });
        }
    }

    fn remaining_from(&self, now: Time, created: Time) -> Option<TimeSpan> {
        (!self.ttl.is_zero()).then(|| self.ttl - (now - created))
    }

    fn sweep(&mut self, now: Time) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        let mut i = 0;
        while i < self.entries.len() {
            match self.entries[i].expire(now, ttl) {
                Expiry::Alive => i += 1,
                Expiry::Partial(id) => {
                    log!(self.logger, "{now}: {id} expired, coded partner kept");
                    i += 1;
                }
                Expiry::Dead(ids) => {
                    self.entries.remove(i);
                    self.counters.expired += 1;
                    self.record(now, Some(TimeSpan::ZERO), RecordKind::Expired);
                    log!(self.logger, "{now}: {} expired", ids.iter().join("+"));
                }
            }
        }
    }

    fn locate(&self, id: PacketId) -> Option<usize> {
        self.entries.iter().position(|e| e.live(id).is_some())
    }

    fn native_index(&self, id: PacketId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, PacketEntry::Native(fields) if fields.id == id))
    }

    fn full(&self) -> bool {
        self.capacity > 0 && self.entries.len() >= self.capacity
    }

    fn make_room(&mut self, now: Time) -> Result<(), Fatal> {
        if !self.full() {
            return Ok(());
        }
        let victim = self.dropper.pick_victim(&mut self.entries)?;
        self.counters.dropped += 1;
        self.record(
            now,
            self.remaining_from(now, victim.created()),
            RecordKind::Dropped,
        );
        log!(
            self.logger,
            "{now}: dropped {} ({})",
            victim.live_ids().join("+"),
            if victim.is_relayed() {
                "relayed"
            } else {
                "source"
            }
        );
        Ok(())
    }

    /// Discards expired packets and returns how many entries went.
    pub fn remove_expired(&mut self, now: Time) -> u64 {
        let before = self.counters.expired;
        self.sweep(now);
        self.counters.expired - before
    }

    /// Buffers a native packet, evicting one entry first if the buffer is full.
    pub fn insert(&mut self, now: Time, mut fields: NativeFields) -> Result<(), Fatal> {
        self.sweep(now);
        if self.locate(fields.id).is_some() {
            return Err(Fatal::DuplicatePacket(fields.id));
        }
        self.make_room(now)?;
        fields.inserted = now;
        self.counters.inserted += 1;
        self.record(
            now,
            self.remaining_from(now, fields.created),
            RecordKind::Inserted,
        );
        log!(
            self.logger,
            "{now}: inserted {} ({} -> {}, {} hops)",
            fields.id,
            fields.source,
            fields.destination,
            fields.hops
        );
        self.entries.push(PacketEntry::Native(fields));
        Ok(())
    }

    /// Buffers a coded pair received as a single payload.
    pub fn insert_encoded(
        &mut self,
        now: Time,
        mut first: NativeFields,
        mut second: NativeFields,
    ) -> Result<(), Fatal> {
        self.sweep(now);
        first.inserted = now;
        second.inserted = now;
        let encoded = EncodedEntry::new(first, second)?;
        let [a, b] = encoded.ids();
        if self
            .entries
            .iter()
            .any(|e| matches!(e, PacketEntry::Encoded(x) if x.combines(a, b)))
        {
            return Err(Fatal::DuplicateEncoding(a, b));
        }
        if let Some(id) = [a, b].into_iter().find(|id| self.locate(*id).is_some()) {
            return Err(Fatal::DuplicatePacket(id));
        }
        self.make_room(now)?;
        let entry = PacketEntry::Encoded(encoded);
        self.counters.inserted += 1;
        self.record(
            now,
            self.remaining_from(now, entry.created()),
            RecordKind::Inserted,
        );
        log!(self.logger, "{now}: inserted coded {a}+{b}");
        self.entries.push(entry);
        Ok(())
    }

    /// Replaces two buffered natives with one coded entry holding both.
    ///
    /// Both constituents carry the per-metric maximum of the two threshold
    /// vectors and the larger of the two replica counts.
    pub fn compact_into_encoded(&mut self, now: Time, a: PacketId, b: PacketId) -> Result<(), Fatal> {
        self.sweep(now);
        let ia = self.native_index(a).ok_or(Fatal::PacketNotFound(a))?;
        let ib = self.native_index(b).ok_or(Fatal::PacketNotFound(b))?;
        let (PacketEntry::Native(fa), PacketEntry::Native(fb)) = (&self.entries[ia], &self.entries[ib])
        else {
            return Err(Fatal::PacketNotFound(a));
        };
        let thresholds = fa
            .thresholds
            .iter()
            .zip_longest(fb.thresholds.iter())
            .map(|pair| pair.reduce(|x, y| if x >= y { x } else { y }))
            .copied()
            .collect_vec();
        let replicas = fa.replicas.max(fb.replicas);
        let merge = |fields: &NativeFields| NativeFields {
            thresholds: thresholds.clone(),
            replicas,
            ..fields.clone()
        };
        let encoded = EncodedEntry::new(merge(fa), merge(fb))?;
        self.entries.remove(ia.max(ib));
        self.entries.remove(ia.min(ib));
        self.entries.push(PacketEntry::Encoded(encoded));
        log!(self.logger, "{now}: encoded {a}+{b}");
        Ok(())
    }

    /// Deletes a packet, returning whether anything changed.
    ///
    /// A constituent of a coded entry is deleted by having the entry mimic
    /// its partner; deleting the partner afterwards removes the entry.
    pub fn remove(&mut self, now: Time, id: PacketId) -> bool {
        self.sweep(now);
        let Some(index) = self.locate(id) else {
            return false;
        };
        let whole = match &self.entries[index] {
            PacketEntry::Native(_) => true,
            PacketEntry::Encoded(encoded) => encoded.mimic().is_some(),
        };
        if whole {
            self.entries.remove(index);
            self.counters.removed += 1;
            log!(self.logger, "{now}: removed {id}");
        } else {
            self.entries[index].mimic_other(id);
            log!(self.logger, "{now}: removed {id} from coded entry");
        }
        true
    }

    pub fn fields(&mut self, now: Time, id: PacketId) -> Result<&NativeFields, Fatal> {
        self.sweep(now);
        self.entries
            .iter()
            .find_map(|e| e.live(id))
            .ok_or(Fatal::PacketNotFound(id))
    }

    fn fields_mut(&mut self, now: Time, id: PacketId) -> Result<&mut NativeFields, Fatal> {
        self.sweep(now);
        self.entries
            .iter_mut()
            .find_map(|e| e.live_mut(id))
            .ok_or(Fatal::PacketNotFound(id))
    }

    pub fn exists(&mut self, now: Time, id: PacketId) -> bool {
        self.sweep(now);
        self.locate(id).is_some()
    }

    /// Whether `id` survives only as side information inside a coded entry.
    pub fn exists_as_extra(&mut self, now: Time, id: PacketId) -> bool {
        self.sweep(now);
        self.entries
            .iter()
            .any(|e| matches!(e, PacketEntry::Encoded(encoded) if encoded.extra() == Some(id)))
    }

    pub fn is_encoded(&mut self, now: Time, id: PacketId) -> Result<bool, Fatal> {
        self.sweep(now);
        self.locate(id)
            .map(|i| self.entries[i].is_encoded())
            .ok_or(Fatal::PacketNotFound(id))
    }

    pub fn encoded_partner(&mut self, now: Time, id: PacketId) -> Result<Option<PacketId>, Fatal> {
        self.sweep(now);
        match self.locate(id).map(|i| &self.entries[i]) {
            Some(PacketEntry::Encoded(encoded)) => Ok(encoded.partner(id)),
            Some(PacketEntry::Native(_)) => Ok(None),
            None => Err(Fatal::PacketNotFound(id)),
        }
    }

    pub fn destination(&mut self, now: Time, id: PacketId) -> Result<NodeId, Fatal> {
        self.fields(now, id).map(|f| f.destination)
    }

    pub fn source(&mut self, now: Time, id: PacketId) -> Result<NodeId, Fatal> {
        self.fields(now, id).map(|f| f.source)
    }

    pub fn creation_time(&mut self, now: Time, id: PacketId) -> Result<Time, Fatal> {
        self.fields(now, id).map(|f| f.created)
    }

    pub fn hops(&mut self, now: Time, id: PacketId) -> Result<u32, Fatal> {
        self.fields(now, id).map(|f| f.hops)
    }

    pub fn prev_hop(&mut self, now: Time, id: PacketId) -> Result<Option<NodeId>, Fatal> {
        self.fields(now, id).map(|f| f.prev_hop)
    }

    /// `None` when the buffer never expires packets.
    pub fn remaining_ttl(&mut self, now: Time, id: PacketId) -> Result<Option<TimeSpan>, Fatal> {
        let ttl = self.ttl;
        self.fields(now, id).map(|f| f.remaining_ttl(now, ttl))
    }

    pub fn replicas(&mut self, now: Time, id: PacketId) -> Result<u32, Fatal> {
        self.fields(now, id).map(|f| f.replicas)
    }

    pub fn set_replicas(&mut self, now: Time, id: PacketId, replicas: u32) -> Result<(), Fatal> {
        self.fields_mut(now, id)?.replicas = replicas;
        Ok(())
    }

    /// Hands `give` replicas to a neighbour and returns how many remain here.
    pub fn split_replicas(&mut self, now: Time, id: PacketId, give: u32) -> Result<u32, Fatal> {
        let fields = self.fields_mut(now, id)?;
        if give > fields.replicas {
            return Err(Fatal::ReplicaOverflow {
                packet: id,
                owned: fields.replicas,
                requested: give,
            });
        }
        fields.replicas -= give;
        Ok(fields.replicas)
    }

    pub fn threshold(&mut self, now: Time, id: PacketId, metric: usize) -> Result<Float, Fatal> {
        self.fields(now, id).map(|f| f.threshold(metric))
    }

    /// Raises the stored threshold if `value` beats it; returns whether it did.
    pub fn update_threshold(
        &mut self,
        now: Time,
        id: PacketId,
        metric: usize,
        value: Float,
    ) -> Result<bool, Fatal> {
        Ok(self.fields_mut(now, id)?.raise_threshold(metric, value))
    }

    pub fn mark_forwarded(&mut self, now: Time, id: PacketId) -> Result<(), Fatal> {
        self.fields_mut(now, id)?.forwarded = true;
        Ok(())
    }

    pub fn was_forwarded(&mut self, now: Time, id: PacketId) -> Result<bool, Fatal> {
        self.fields(now, id).map(|f| f.forwarded)
    }

    pub fn add_forwarder(&mut self, now: Time, id: PacketId, node: NodeId) -> Result<(), Fatal> {
        self.fields_mut(now, id)?.add_forwarder(node);
        Ok(())
    }

    pub fn forwarded_to(&mut self, now: Time, id: PacketId, node: NodeId) -> Result<bool, Fatal> {
        self.fields(now, id).map(|f| f.forwarders.contains(&node))
    }

    pub fn add_previous_hop(&mut self, now: Time, id: PacketId, node: NodeId) -> Result<(), Fatal> {
        self.fields_mut(now, id)?.add_previous_hop(node);
        Ok(())
    }

    pub fn previous_hops(&mut self, now: Time, id: PacketId) -> Result<Vec<NodeId>, Fatal> {
        self.fields(now, id).map(|f| f.previous_hops.clone())
    }

    /// Distance of the packet's entry from the front of the buffer.
    pub fn position(&mut self, now: Time, id: PacketId) -> Result<usize, Fatal> {
        self.sweep(now);
        self.locate(id).ok_or(Fatal::PacketNotFound(id))
    }

    pub fn distance_from_end(&mut self, now: Time, id: PacketId) -> Result<usize, Fatal> {
        let position = self.position(now, id)?;
        Ok(self.entries.len() - 1 - position)
    }

    pub fn positions(&mut self, now: Time) -> PositionIndex {
        self.sweep(now);
        self.entries
            .iter()
            .flat_map(PacketEntry::live_ids)
            .enumerate()
            .map(|(slot, id)| (id, slot))
            .collect()
    }

    /// Live packets headed to any of `destinations`, in buffer order.
    pub fn candidates_for(&mut self, now: Time, destinations: &[NodeId]) -> Vec<PacketId> {
        self.sweep(now);
        self.entries
            .iter()
            .flat_map(PacketEntry::live_parts)
            .filter(|p| destinations.contains(&p.destination))
            .map(|p| p.id)
            .unique()
            .collect()
    }

    pub fn all_destinations(&mut self, now: Time) -> Vec<NodeId> {
        self.sweep(now);
        self.entries
            .iter()
            .flat_map(PacketEntry::live_parts)
            .map(|p| p.destination)
            .unique()
            .collect()
    }

    /// Every live packet, with both halves of an intact coded entry listed.
    pub fn all_native(&mut self, now: Time) -> Vec<PacketId> {
        self.sweep(now);
        self.entries
            .iter()
            .flat_map(PacketEntry::live_ids)
            .unique()
            .collect()
    }

    pub fn packets_for(&mut self, now: Time, destination: NodeId) -> usize {
        self.candidates_for(now, &[destination]).len()
    }

    pub fn entries(&mut self, now: Time) -> &[PacketEntry] {
        self.sweep(now);
        &self.entries
    }

    pub fn len(&mut self, now: Time) -> usize {
        self.sweep(now);
        self.entries.len()
    }

    pub fn is_empty(&mut self, now: Time) -> bool {
        self.len(now) == 0
    }

    pub fn is_full(&mut self, now: Time) -> bool {
        self.sweep(now);
        self.full()
    }

    /// Free slots, or `None` for an unbounded buffer.
    pub fn available_space(&mut self, now: Time) -> Option<usize> {
        self.sweep(now);
        (self.capacity > 0).then(|| self.capacity.saturating_sub(self.entries.len()))
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn ttl(&self) -> TimeSpan {
        self.ttl
    }

    #[must_use]
    pub const fn counters(&self) -> StoreCounters {
        self.counters
    }

    #[must_use]
    pub fn drop_stats(&self) -> DropStats {
        self.dropper.stats()
    }

    #[must_use]
    pub const fn records(&self) -> Option<&RecordLog> {
        self.records.as_ref()
    }

    #[must_use]
    pub const fn logger(&self) -> &L {
        &self.logger
    }
}
