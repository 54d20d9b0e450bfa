use rand_distr::Distribution;

use crate::{
    config::SimulationConfig,
    error::Fatal,
    event::{Event, EventKind, EventQueue},
    packet::{NodeId, PacketId},
    quantities::{seconds, Float, Time},
    util::rand::{ContinuousDistribution, DiscreteDistribution},
};

/// Shortest gap or contact the generator produces, in seconds.
const MIN_SPAN: Float = 1e-3;

/// A contact and traffic trace standing in for an imported one.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub events: Vec<Event>,
    pub contacts: u64,
    pub packets: u64,
}

impl Trace {
    /// Moves every event into `queue`.
    pub fn schedule(self, queue: &mut EventQueue) -> Result<(), Fatal> {
        self.events.into_iter().try_for_each(|event| queue.insert(event))
    }
}

fn span<R: rand::Rng + ?Sized>(rng: &mut R, dist: &ContinuousDistribution<Float>) -> Float {
    rng.sample(dist).max(MIN_SPAN)
}

fn distinct_pair<R: rand::Rng + ?Sized>(rng: &mut R, nodes: usize) -> (NodeId, NodeId) {
    let a = rng.sample(DiscreteDistribution::Uniform { min: 0, max: nodes });
    let mut b = rng.sample(DiscreteDistribution::Uniform {
        min: 0,
        max: nodes - 1,
    });
    if b >= a {
        b += 1;
    }
    (NodeId(a), NodeId(b))
}

impl Distribution<Trace> for SimulationConfig {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Trace {
        let end = self.duration.seconds();
        let mut trace = Trace {
            events: Vec::new(),
            contacts: 0,
            packets: 0,
        };
        if self.nodes >= 2 {
            let mut t = span(rng, &self.trace.inter_contact);
            while t < end {
                let (a, b) = distinct_pair(rng, self.nodes);
                let length = span(rng, &self.trace.contact_duration);
                let up = Time::from_sim_start(t);
                trace.events.push(Event::new(up, EventKind::ContactUp { a, b }));
                trace
                    .events
                    .push(Event::new(up + seconds(length), EventKind::ContactDown { a, b }));
                trace.contacts += 1;
                t += span(rng, &self.trace.inter_contact);
            }
            let mut t = span(rng, &self.trace.inter_generation);
            while t < end {
                let (source, destination) = distinct_pair(rng, self.nodes);
                trace.events.push(Event::new(
                    Time::from_sim_start(t),
                    EventKind::PacketGeneration {
                        source,
                        destination,
                        packet: PacketId(trace.packets),
                        valid: true,
                    },
                ));
                trace.packets += 1;
                t += span(rng, &self.trace.inter_generation);
            }
        }
        let interval = self.trace.checkpoint_interval.seconds();
        if interval > 0. {
            let mut t = interval;
            while t < end {
                trace
                    .events
                    .push(Event::new(Time::from_sim_start(t), EventKind::CheckPoint));
                t += interval;
            }
        }
        trace
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::{
        config::SimulationConfig,
        event::{EventKind, EventQueue},
        quantities::{seconds, Time},
        util::rand::Rng,
    };

    use super::Trace;

    fn trace(seed: u64) -> Trace {
        let config = SimulationConfig {
            seed,
            duration: seconds(2_000.),
            ..SimulationConfig::default()
        };
        Rng::from_seed(config.seed).sample(&config)
    }

    #[test]
    fn same_seed_same_trace() {
        assert_eq!(trace(7), trace(7));
        assert_ne!(trace(7), trace(8));
    }

    #[test]
    fn events_are_well_formed() {
        let trace = trace(3);
        assert!(trace.contacts > 0);
        assert!(trace.packets > 0);
        let end = Time::from_sim_start(2_000.);
        for event in &trace.events {
            match event.kind {
                EventKind::ContactUp { a, b } | EventKind::ContactDown { a, b } => {
                    assert_ne!(a, b);
                }
                EventKind::PacketGeneration {
                    source,
                    destination,
                    ..
                } => {
                    assert_ne!(source, destination);
                    assert!(event.time < end);
                }
                EventKind::CheckPoint => assert!(event.time < end),
                EventKind::Transmission { .. } => panic!("generator produced a transmission"),
            }
        }
        let checkpoints = trace
            .events
            .iter()
            .filter(|e| e.kind == EventKind::CheckPoint)
            .count();
        assert_eq!(checkpoints, 1);
    }

    #[test]
    fn schedules_in_time_order() {
        let trace = trace(11);
        let expected = trace.events.len();
        let mut queue = EventQueue::new();
        trace.schedule(&mut queue).unwrap();
        assert_eq!(queue.len(), expected);
        let times = std::iter::from_fn(|| queue.pop_earliest())
            .map(|e| e.time)
            .collect_vec();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}
