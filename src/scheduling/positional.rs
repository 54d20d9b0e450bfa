use std::cmp::Reverse;

use crate::{
    error::Fatal,
    packet::{PacketId, PositionIndex},
};

use super::{Candidates, SchedulingPolicy, UtilityHint};

/// Oldest buffered packet first.
#[derive(Debug, Default)]
pub struct Fifo {
    candidates: Candidates,
}

impl SchedulingPolicy for Fifo {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.candidates.push(packet, hint);
    }

    fn compute_order(
        &mut self,
        positions: &PositionIndex,
    ) -> Result<Option<Vec<PacketId>>, Fatal> {
        self.candidates
            .drain_sorted(positions, |_, position, _| Ok(position))
    }
}

/// Most recently buffered packet first.
#[derive(Debug, Default)]
pub struct Lifo {
    candidates: Candidates,
}

impl SchedulingPolicy for Lifo {
    fn add(&mut self, packet: PacketId, hint: Option<UtilityHint>) {
        self.candidates.push(packet, hint);
    }

    fn compute_order(
        &mut self,
        positions: &PositionIndex,
    ) -> Result<Option<Vec<PacketId>>, Fatal> {
        self.candidates
            .drain_sorted(positions, |_, position, _| Ok(Reverse(position)))
    }
}
