use crate::packet::PacketEntry;

use super::VictimRule;

/// The entry that has been buffered longest.
#[derive(Debug, Clone, Copy)]
pub struct Front;

impl VictimRule for Front {
    fn select(
        &self,
        entries: &[PacketEntry],
        eligible: &dyn Fn(&PacketEntry) -> bool,
    ) -> Option<usize> {
        entries.iter().position(eligible)
    }
}

/// The most recently buffered entry.
#[derive(Debug, Clone, Copy)]
pub struct Tail;

impl VictimRule for Tail {
    fn select(
        &self,
        entries: &[PacketEntry],
        eligible: &dyn Fn(&PacketEntry) -> bool,
    ) -> Option<usize> {
        entries.iter().rposition(eligible)
    }
}
