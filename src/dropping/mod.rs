use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{error::Fatal, packet::PacketEntry};

mod age;
mod positional;

pub use age::{Oldest, Youngest};
pub use positional::{Front, Tail};

/// How many evictions hit packets created here versus packets carried for others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    pub source: u64,
    pub relayed: u64,
}

impl DropStats {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.source + self.relayed
    }
}

/// Chooses which buffered entry to give up when the buffer overflows.
pub trait DroppingPolicy: Debug {
    /// Removes exactly one entry from a non-empty buffer and returns it.
    fn pick_victim(&mut self, entries: &mut Vec<PacketEntry>) -> Result<PacketEntry, Fatal>;

    fn stats(&self) -> DropStats;
}

/// Selects a victim among the entries accepted by `eligible`.
pub trait VictimRule: Debug {
    fn select(
        &self,
        entries: &[PacketEntry],
        eligible: &dyn Fn(&PacketEntry) -> bool,
    ) -> Option<usize>;
}

/// Applies a [`VictimRule`], optionally sparing packets created by this node
/// while any relayed entry is available.
#[derive(Debug)]
pub struct Evictor<R> {
    rule: R,
    avoid_source: bool,
    stats: DropStats,
}

impl<R> Evictor<R> {
    pub const fn new(rule: R, avoid_source: bool) -> Evictor<R> {
        Evictor {
            rule,
            avoid_source,
            stats: DropStats {
                source: 0,
                relayed: 0,
            },
        }
    }
}

impl<R> DroppingPolicy for Evictor<R>
where
    R: VictimRule,
{
    fn pick_victim(&mut self, entries: &mut Vec<PacketEntry>) -> Result<PacketEntry, Fatal> {
        let relayed_first = if self.avoid_source {
            self.rule.select(entries, &PacketEntry::is_relayed)
        } else {
            None
        };
        let index = relayed_first
            .or_else(|| self.rule.select(entries, &|_| true))
            .ok_or(Fatal::EmptyBufferEviction)?;
        let victim = entries.remove(index);
        if victim.is_relayed() {
            self.stats.relayed += 1;
        } else {
            self.stats.source += 1;
        }
        Ok(victim)
    }

    fn stats(&self) -> DropStats {
        self.stats
    }
}

/// Registry of the available dropping policies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DroppingPolicyKind {
    DropFront,
    DropTail,
    DropOldest,
    DropYoungest,
    DropFrontAsp,
    DropTailAsp,
    DropOldestAsp,
    DropYoungestAsp,
}

impl DroppingPolicyKind {
    pub const ALL: [DroppingPolicyKind; 8] = [
        DroppingPolicyKind::DropFront,
        DroppingPolicyKind::DropTail,
        DroppingPolicyKind::DropOldest,
        DroppingPolicyKind::DropYoungest,
        DroppingPolicyKind::DropFrontAsp,
        DroppingPolicyKind::DropTailAsp,
        DroppingPolicyKind::DropOldestAsp,
        DroppingPolicyKind::DropYoungestAsp,
    ];

    #[must_use]
    pub fn build(self) -> Box<dyn DroppingPolicy> {
        match self {
            DroppingPolicyKind::DropFront => Box::new(Evictor::new(Front, false)),
            DroppingPolicyKind::DropTail => Box::new(Evictor::new(Tail, false)),
            DroppingPolicyKind::DropOldest => Box::new(Evictor::new(Oldest, false)),
            DroppingPolicyKind::DropYoungest => Box::new(Evictor::new(Youngest, false)),
            DroppingPolicyKind::DropFrontAsp => Box::new(Evictor::new(Front, true)),
            DroppingPolicyKind::DropTailAsp => Box::new(Evictor::new(Tail, true)),
            DroppingPolicyKind::DropOldestAsp => Box::new(Evictor::new(Oldest, true)),
            DroppingPolicyKind::DropYoungestAsp => Box::new(Evictor::new(Youngest, true)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use itertools::Itertools;

    use crate::{
        error::Fatal,
        packet::{NativeFields, NodeId, PacketEntry, PacketId},
        quantities::Time,
    };

    use super::{DropStats, DroppingPolicyKind};

    pub(crate) fn entry(id: u64, hops: u32, created: f64) -> PacketEntry {
        PacketEntry::Native(
            NativeFields::new(
                PacketId(id),
                NodeId(0),
                NodeId(1),
                Time::from_sim_start(created),
            )
            .with_hops(hops),
        )
    }

    fn evict(kind: DroppingPolicyKind, entries: &[PacketEntry]) -> (PacketId, DropStats) {
        let mut policy = kind.build();
        let mut entries = entries.to_vec();
        let victim = policy.pick_victim(&mut entries).unwrap();
        assert_eq!(entries.len(), 2);
        let ids = victim.live_ids().collect_vec();
        assert_eq!(ids.len(), 1);
        (ids[0], policy.stats())
    }

    #[test]
    fn plain_rules() {
        let entries = [entry(1, 0, 5.), entry(2, 2, 3.), entry(3, 0, 9.)];
        assert_eq!(evict(DroppingPolicyKind::DropFront, &entries).0, PacketId(1));
        assert_eq!(evict(DroppingPolicyKind::DropTail, &entries).0, PacketId(3));
        assert_eq!(evict(DroppingPolicyKind::DropOldest, &entries).0, PacketId(2));
        assert_eq!(evict(DroppingPolicyKind::DropYoungest, &entries).0, PacketId(3));
    }

    #[test]
    fn avoid_source_prefers_relayed() {
        let entries = [entry(1, 0, 5.), entry(2, 2, 7.), entry(3, 0, 9.)];
        for kind in [
            DroppingPolicyKind::DropFrontAsp,
            DroppingPolicyKind::DropTailAsp,
            DroppingPolicyKind::DropOldestAsp,
            DroppingPolicyKind::DropYoungestAsp,
        ] {
            let (victim, stats) = evict(kind, &entries);
            assert_eq!(victim, PacketId(2), "{kind:?}");
            assert_eq!(stats, DropStats { source: 0, relayed: 1 });
        }
    }

    #[test]
    fn avoid_source_falls_back() {
        let entries = [entry(1, 0, 5.), entry(2, 0, 3.), entry(3, 0, 9.)];
        let (victim, stats) = evict(DroppingPolicyKind::DropOldestAsp, &entries);
        assert_eq!(victim, PacketId(2));
        assert_eq!(stats, DropStats { source: 1, relayed: 0 });
        assert_eq!(
            evict(DroppingPolicyKind::DropTailAsp, &entries).0,
            PacketId(3)
        );
    }

    #[test]
    fn empty_buffer_is_fatal() {
        let mut policy = DroppingPolicyKind::DropFront.build();
        assert_eq!(
            policy.pick_victim(&mut Vec::new()),
            Err(Fatal::EmptyBufferEviction)
        );
        assert_eq!(policy.stats().total(), 0);
    }
}
