use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::{
    error::Fatal,
    packet::{PacketId, PositionIndex},
    quantities::Float,
};

use super::{Candidates, SchedulingPolicy, UtilityHint};

fn hint_for(packet: PacketId, hint: Option<UtilityHint>) -> Result<UtilityHint, Fatal> {
    hint.ok_or(Fatal::MissingUtility(packet))
}

/// Larger value first, earlier buffer position breaking ties.
type Descending = (Reverse<OrderedFloat<Float>>, usize);

const fn descending(value: Float, position: usize) -> Descending {
    (Reverse(OrderedFloat(value)), position)
}

/// Packets whose destination the receiver is best placed to reach go first.
#[derive(Debug, Default)]
pub struct GrtrMax {
    candidates: Candidates,
}

impl SchedulingPolicy for GrtrMax {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.candidates.push(packet, hint);
    }

    fn compute_order(
        &mut self,
        positions: &PositionIndex,
    ) -> Result<Option<Vec<PacketId>>, Fatal> {
        self.candidates.drain_sorted(positions, |id, position, hint| {
            let hint = hint_for(id, hint)?;
            Ok(descending(hint.receiver, position))
        })
    }
}

/// Largest utility gain from handing the packet over goes first.
#[derive(Debug, Default)]
pub struct GrtrSort {
    candidates: Candidates,
}

impl SchedulingPolicy for GrtrSort {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.candidates.push(packet, hint);
    }

    fn compute_order(
        &mut self,
        positions: &PositionIndex,
    ) -> Result<Option<Vec<PacketId>>, Fatal> {
        self.candidates.drain_sorted(positions, |id, position, hint| {
            let hint = hint_for(id, hint)?;
            Ok(descending(hint.receiver - hint.sender, position))
        })
    }
}

/// Highest normalised utility value, `(recv - send) / (recv + send)`, goes first.
#[derive(Debug, Default)]
pub struct Hnuv {
    candidates: Candidates,
}

impl SchedulingPolicy for Hnuv {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.candidates.push(packet, hint);
    }

    fn compute_order(
        &mut self,
        positions: &PositionIndex,
    ) -> Result<Option<Vec<PacketId>>, Fatal> {
        self.candidates.drain_sorted(positions, |id, position, hint| {
            let hint = hint_for(id, hint)?;
            let total = hint.receiver + hint.sender;
            if total == 0. {
                return Err(Fatal::ZeroDenominator(id));
            }
            Ok(descending((hint.receiver - hint.sender) / total, position))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::Fatal,
        packet::PacketId,
        scheduling::{tests::positions, SchedulingPolicy, UtilityHint},
    };

    use super::{GrtrMax, GrtrSort, Hnuv};

    fn offer(policy: &mut dyn SchedulingPolicy, offers: &[(u64, f64, f64)]) {
        for &(id, sender, receiver) in offers {
            policy.add(PacketId(id), Some(UtilityHint::new(sender, receiver)));
        }
    }

    fn ids(ids: &[u64]) -> Option<Vec<PacketId>> {
        Some(ids.iter().copied().map(PacketId).collect())
    }

    #[test]
    fn grtr_max_prefers_receiver_utility() {
        let mut policy = GrtrMax::default();
        offer(&mut policy, &[(1, 0.9, 0.5), (2, 0., 0.75), (0, 0.1, 0.5)]);
        assert_eq!(policy.compute_order(&positions(3)), Ok(ids(&[2, 0, 1])));
    }

    #[test]
    fn grtr_sort_uses_difference() {
        let mut policy = GrtrSort::default();
        offer(&mut policy, &[(2, 0.5, 0.75), (1, 0., 0.5), (0, 0.25, 0.5)]);
        assert_eq!(policy.compute_order(&positions(3)), Ok(ids(&[1, 0, 2])));
    }

    #[test]
    fn hnuv_normalises_difference() {
        let mut policy = Hnuv::default();
        // (0.5 - 0.25) / 0.75 = 1/3 and (0.25 - 0.125) / 0.375 = 1/3, so position decides.
        offer(&mut policy, &[(2, 0.25, 0.5), (0, 0.125, 0.25), (1, 0., 0.125)]);
        assert_eq!(policy.compute_order(&positions(3)), Ok(ids(&[1, 0, 2])));
    }

    #[test]
    fn hnuv_rejects_zero_sum() {
        let mut policy = Hnuv::default();
        offer(&mut policy, &[(0, 0.5, 0.5), (1, 0., 0.)]);
        assert_eq!(
            policy.compute_order(&positions(2)),
            Err(Fatal::ZeroDenominator(PacketId(1)))
        );
        assert_eq!(policy.compute_order(&positions(2)), Ok(None));
    }

    #[test]
    fn utilities_are_required() {
        let mut policy = GrtrSort::default();
        policy.add(PacketId(0), None);
        assert_eq!(
            policy.compute_order(&positions(1)),
            Err(Fatal::MissingUtility(PacketId(0)))
        );
    }
}
