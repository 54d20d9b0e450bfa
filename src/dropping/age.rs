use crate::{packet::PacketEntry, quantities::Time};

use super::VictimRule;

/// Scans front to back, replacing the candidate only on a strict improvement
/// so ties go to the entry met first.
fn first_extreme(
    entries: &[PacketEntry],
    eligible: &dyn Fn(&PacketEntry) -> bool,
    better: impl Fn(Time, Time) -> bool,
) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|&(_, e)| eligible(e))
        .fold(None, |best: Option<(usize, Time)>, (i, e)| {
            let created = e.created();
            match best {
                Some((_, current)) if !better(created, current) => best,
                _ => Some((i, created)),
            }
        })
        .map(|(i, _)| i)
}

/// The entry with the earliest creation time.
#[derive(Debug, Clone, Copy)]
pub struct Oldest;

impl VictimRule for Oldest {
    fn select(
        &self,
        entries: &[PacketEntry],
        eligible: &dyn Fn(&PacketEntry) -> bool,
    ) -> Option<usize> {
        first_extreme(entries, eligible, |a, b| a < b)
    }
}

/// The entry with the latest creation time.
#[derive(Debug, Clone, Copy)]
pub struct Youngest;

impl VictimRule for Youngest {
    fn select(
        &self,
        entries: &[PacketEntry],
        eligible: &dyn Fn(&PacketEntry) -> bool,
    ) -> Option<usize> {
        first_extreme(entries, eligible, |a, b| a > b)
    }
}
