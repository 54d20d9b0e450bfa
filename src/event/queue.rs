use std::{cmp::Reverse, collections::BTreeMap};

use crate::{error::Fatal, packet::NodeId, quantities::Time};

use super::{Event, EventKind};

/// Pending events in timestamp order.
///
/// An event inserted at the same time as existing ones is extracted
/// before them. Popping an event moves [`EventQueue::now`] forward, and
/// nothing may be scheduled before that point afterwards.
#[derive(Debug)]
pub struct EventQueue {
    now: Time,
    sequence: u64,
    events: BTreeMap<(Time, Reverse<u64>), Event>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    #[must_use]
    pub const fn new() -> EventQueue {
        EventQueue {
            now: Time::MIN,
            sequence: 0,
            events: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, event: Event) -> Result<(), Fatal> {
        if event.time < self.now {
            return Err(Fatal::EventInPast);
        }
        self.sequence += 1;
        self.events
            .insert((event.time, Reverse(self.sequence)), event);
        Ok(())
    }

    pub fn pop_earliest(&mut self) -> Option<Event> {
        let (_, event) = self.events.pop_first()?;
        self.now = event.time;
        Some(event)
    }

    #[must_use]
    pub fn peek_time(&self) -> Option<Time> {
        self.events.first_key_value().map(|(&(time, _), _)| time)
    }

    /// Time of the most recently popped event.
    #[must_use]
    pub const fn now(&self) -> Time {
        self.now
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Aborts the pending transfers between `a` and `b` and returns how many there were.
    pub fn invalidate_link(&mut self, a: NodeId, b: NodeId) -> usize {
        let mut aborted = 0;
        for event in self.events.values_mut() {
            if event.kind.is_transfer_between(a, b) {
                if let EventKind::Transmission { valid, .. } = &mut event.kind {
                    if *valid {
                        *valid = false;
                        aborted += 1;
                    }
                }
            }
        }
        aborted
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        error::Fatal,
        event::{Event, EventKind},
        packet::{NodeId, PacketId},
        quantities::Time,
    };

    use super::EventQueue;

    fn at(t: f64, kind: EventKind) -> Event {
        Event::new(Time::from_sim_start(t), kind)
    }

    fn transfer(sender: usize, receiver: usize, packet: u64) -> EventKind {
        EventKind::Transmission {
            sender: NodeId(sender),
            receiver: NodeId(receiver),
            packet: PacketId(packet),
            valid: true,
        }
    }

    #[test]
    fn pops_in_time_order() {
        let mut queue = EventQueue::new();
        for t in [5., 1., 3.] {
            queue.insert(at(t, EventKind::CheckPoint)).unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_time(), Some(Time::from_sim_start(1.)));
        let times: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|e| e.time.since_start())
            .collect();
        assert_eq!(times, vec![1., 3., 5.]);
        assert!(queue.is_empty());
        assert_eq!(queue.now(), Time::from_sim_start(5.));
    }

    #[test]
    fn equal_times_pop_newest_first() {
        let mut queue = EventQueue::new();
        queue.insert(at(2., transfer(0, 1, 1))).unwrap();
        queue.insert(at(2., transfer(0, 1, 2))).unwrap();
        queue.insert(at(1., transfer(0, 1, 3))).unwrap();
        let order: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|e| e.kind)
            .collect();
        assert_eq!(order, vec![transfer(0, 1, 3), transfer(0, 1, 2), transfer(0, 1, 1)]);
    }

    #[test]
    fn past_events_are_rejected() {
        let mut queue = EventQueue::new();
        queue.insert(at(4., EventKind::CheckPoint)).unwrap();
        queue.pop_earliest();
        assert_eq!(queue.insert(at(3., EventKind::CheckPoint)), Err(Fatal::EventInPast));
        assert!(queue.is_empty());
        queue.insert(at(4., EventKind::CheckPoint)).unwrap();
    }

    #[test]
    fn link_invalidation() {
        let mut queue = EventQueue::new();
        queue.insert(at(1., transfer(0, 1, 1))).unwrap();
        queue.insert(at(2., transfer(1, 0, 2))).unwrap();
        queue.insert(at(3., transfer(0, 2, 3))).unwrap();
        assert_eq!(queue.invalidate_link(NodeId(1), NodeId(0)), 2);
        assert_eq!(queue.invalidate_link(NodeId(0), NodeId(1)), 0);
        let valid: Vec<_> = std::iter::from_fn(|| queue.pop_earliest())
            .map(|e| matches!(e.kind, EventKind::Transmission { valid: true, .. }))
            .collect();
        assert_eq!(valid, vec![false, false, true]);
    }
}
