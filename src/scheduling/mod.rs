use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{
    error::Fatal,
    packet::{PacketId, PositionIndex},
    quantities::Float,
};

mod positional;
mod utility;

pub use positional::{Fifo, Lifo};
pub use utility::{GrtrMax, GrtrSort, Hnuv};

/// Utility of the packet's destination as seen from each end of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilityHint {
    pub sender: Float,
    pub receiver: Float,
}

impl UtilityHint {
    #[must_use]
    pub const fn new(sender: Float, receiver: Float) -> UtilityHint {
        UtilityHint { sender, receiver }
    }
}

/// Orders the packets offered during one contact.
///
/// Candidates accumulate through [`SchedulingPolicy::add`];
/// [`SchedulingPolicy::compute_order`] consumes them, so the same policy
/// object serves every contact of its node.
pub trait SchedulingPolicy: Debug {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>);

    /// Highest priority first, or `None` when nothing was offered.
    fn compute_order(&mut self, positions: &PositionIndex)
        -> Result<Option<Vec<PacketId>>, Fatal>;
}

/// Candidates gathered since the last order was computed.
#[derive(Debug, Default)]
pub struct Candidates {
    pending: Vec<(PacketId, Option<UtilityHint>)>,
}

impl Candidates {
    pub fn push(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.pending.push((packet, hint));
    }

    /// Empties the accumulator and sorts what it held by `key`.
    ///
    /// Keys must be distinct: two candidates that compare equal mean the
    /// caller offered the same buffer slot twice.
    pub fn drain_sorted<K, F>(
        &mut self,
        positions: &PositionIndex,
        key: F,
    ) -> Result<Option<Vec<PacketId>>, Fatal>
    where
        K: Ord,
        F: Fn(PacketId, usize, Option<UtilityHint>) -> Result<K, Fatal>,
    {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(None);
        }
        let mut keyed = pending
            .into_iter()
            .map(|(id, hint)| {
                let position = *positions.get(&id).ok_or(Fatal::PacketNotFound(id))?;
                Ok((key(id, position, hint)?, id))
            })
            .collect::<Result<Vec<_>, Fatal>>()?;
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(tied) = keyed.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(Fatal::TiedSortKeys(tied[0].1, tied[1].1));
        }
        Ok(Some(keyed.into_iter().map(|(_, id)| id).collect()))
    }
}

/// Registry of the available scheduling policies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicyKind {
    Fifo,
    Lifo,
    GrtrMax,
    GrtrSort,
    Hnuv,
}

impl SchedulingPolicyKind {
    pub const ALL: [SchedulingPolicyKind; 5] = [
        SchedulingPolicyKind::Fifo,
        SchedulingPolicyKind::Lifo,
        SchedulingPolicyKind::GrtrMax,
        SchedulingPolicyKind::GrtrSort,
        SchedulingPolicyKind::Hnuv,
    ];

    #[must_use]
    pub fn build(self) -> Box<dyn SchedulingPolicy> {
        match self {
            SchedulingPolicyKind::Fifo => Box::<Fifo>::default(),
            SchedulingPolicyKind::Lifo => Box::<Lifo>::default(),
            SchedulingPolicyKind::GrtrMax => Box::<GrtrMax>::default(),
            SchedulingPolicyKind::GrtrSort => Box::<GrtrSort>::default(),
            SchedulingPolicyKind::Hnuv => Box::<Hnuv>::default(),
        }
    }

    #[must_use]
    pub const fn uses_utilities(self) -> bool {
        matches!(
            self,
            SchedulingPolicyKind::GrtrMax | SchedulingPolicyKind::GrtrSort | SchedulingPolicyKind::Hnuv
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::packet::{PacketId, PositionIndex};

    use super::{SchedulingPolicyKind, UtilityHint};

    /// Packet `i` sits at buffer position `i`.
    pub(crate) fn positions(count: u64) -> PositionIndex {
        (0..count).map(|i| (PacketId(i), i as usize)).collect()
    }

    #[test]
    fn order_is_deterministic() {
        let offers = [(4, 0.125, 0.875), (2, 0.25, 0.5), (7, 0.0, 0.5), (5, 0.25, 0.75)];
        let run = || {
            let mut policy = SchedulingPolicyKind::GrtrSort.build();
            for (id, sender, receiver) in offers {
                policy.add(PacketId(id), Some(UtilityHint::new(sender, receiver)));
            }
            policy.compute_order(&positions(8)).unwrap().unwrap()
        };
        let order = run();
        assert_eq!(order, run());
        insta::assert_yaml_snapshot!(order);
    }

    #[test]
    fn policies_are_reusable() {
        for kind in SchedulingPolicyKind::ALL {
            let mut policy = kind.build();
            policy.add(PacketId(1), Some(UtilityHint::new(0.2, 0.4)));
            assert!(policy.compute_order(&positions(2)).unwrap().is_some());
            assert_eq!(policy.compute_order(&positions(2)), Ok(None), "{kind:?}");
        }
    }
}
