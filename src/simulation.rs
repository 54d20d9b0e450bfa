use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use vec_map::VecMap;

use crate::{
    config::{ForwardingRule, ProtocolConfig, SimulationConfig},
    congestion::PacketInfo,
    error::Fatal,
    event::{Event, EventKind, EventQueue},
    node::Node,
    packet::{NativeFields, NodeId, PacketId},
    quantities::{Float, Time, TimeSpan},
    scheduling::UtilityHint,
    synthetic::Trace,
    util::{
        average::Mean,
        logging::{Logger, NothingLogger},
        rand::Rng,
    },
};

/// Raw totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub events: u64,
    pub contacts: u64,
    pub generated: u64,
    pub delivered: u64,
    pub transmitted: u64,
    /// Transfers cut short by the end of a contact.
    pub aborted: u64,
    pub dropped: u64,
    pub dropped_source: u64,
    pub dropped_relayed: u64,
    pub expired: u64,
    pub mean_latency: Option<TimeSpan>,
}

impl SimulationReport {
    #[must_use]
    pub fn delivery_ratio(&self) -> Float {
        if self.generated == 0 {
            return 0.;
        }
        #[allow(clippy::cast_precision_loss)]
        return self.delivered as Float / self.generated as Float;
    }
}

fn link(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    (a.min(b), a.max(b))
}

/// Drives the nodes through a contact trace with a replication-based
/// forwarding protocol.
///
/// On every new contact each side offers the packets the other lacks,
/// orders them with its scheduling policy, lets its congestion control
/// trim the list and queues one transmission per admitted packet, spaced
/// by the transmission time.
#[derive(Debug)]
pub struct Simulator<L = NothingLogger> {
    protocol: ProtocolConfig,
    end: Time,
    nodes: VecMap<Node<L>>,
    queue: EventQueue,
    links: FxHashMap<(NodeId, NodeId), u32>,
    in_flight: BTreeSet<(NodeId, PacketId)>,
    latency: Mean<TimeSpan>,
    report: SimulationReport,
    logger: L,
}

impl<L> Simulator<L>
where
    L: Logger,
{
    /// Builds the nodes and a synthetic trace drawn from the configured seed.
    ///
    /// `loggers` is called once for the simulator itself and once per node
    /// with the name each should log under.
    pub fn new(config: &SimulationConfig, loggers: impl FnMut(&str) -> L) -> Result<Simulator<L>, Fatal> {
        let trace: Trace = Rng::from_seed(config.seed).sample(config);
        Simulator::from_trace(config, trace, loggers)
    }

    pub fn from_trace(
        config: &SimulationConfig,
        trace: Trace,
        mut loggers: impl FnMut(&str) -> L,
    ) -> Result<Simulator<L>, Fatal> {
        let mut queue = EventQueue::new();
        trace.schedule(&mut queue)?;
        let nodes = (0..config.nodes)
            .map(|i| {
                let id = NodeId(i);
                let logger = loggers(&id.to_string());
                (i, Node::new(id, &config.buffer, &config.policies, logger))
            })
            .collect();
        Ok(Simulator {
            protocol: config.protocol.clone(),
            end: Time::SIM_START + config.duration,
            nodes,
            queue,
            links: FxHashMap::default(),
            in_flight: BTreeSet::new(),
            latency: Mean::new(),
            report: SimulationReport::default(),
            logger: loggers("sim"),
        })
    }

    pub fn node(&mut self, id: NodeId) -> Result<&mut Node<L>, Fatal> {
        self.nodes.get_mut(id.0).ok_or(Fatal::UnknownNode(id))
    }

    #[must_use]
    pub const fn logger(&self) -> &L {
        &self.logger
    }

    /// Processes every event up to the configured duration.
    pub fn run(&mut self) -> Result<SimulationReport, Fatal> {
        while let Some(time) = self.queue.peek_time() {
            if time > self.end {
                break;
            }
            let Some(event) = self.queue.pop_earliest() else {
                break;
            };
            self.report.events += 1;
            log!(self.logger, "{}: {}", event.time, event.kind);
            self.handle(event)?;
        }
        Ok(self.finish())
    }

    fn handle(&mut self, Event { time: now, kind }: Event) -> Result<(), Fatal> {
        match kind {
            EventKind::ContactUp { a, b } => self.contact_up(now, a, b),
            EventKind::ContactDown { a, b } => {
                self.contact_down(a, b);
                Ok(())
            }
            EventKind::Transmission {
                sender,
                receiver,
                packet,
                valid,
            } => self.transmission(now, sender, receiver, packet, valid),
            EventKind::PacketGeneration {
                source,
                destination,
                packet,
                valid,
            } => {
                self.node(destination)?;
                if valid {
                    let fields = NativeFields::new(packet, source, destination, now);
                    self.node(source)?.store.insert(now, fields)?;
                    self.report.generated += 1;
                }
                Ok(())
            }
            EventKind::CheckPoint => {
                for node in self.nodes.values_mut() {
                    node.store.remove_expired(now);
                }
                Ok(())
            }
        }
    }

    fn contact_up(&mut self, now: Time, a: NodeId, b: NodeId) -> Result<(), Fatal> {
        self.node(a)?;
        self.node(b)?;
        let open = self.links.entry(link(a, b)).or_default();
        *open += 1;
        if *open > 1 {
            return Ok(());
        }
        self.report.contacts += 1;
        self.node(a)?.record_encounter(b);
        self.node(b)?.record_encounter(a);
        self.offer(now, a, b)?;
        self.offer(now, b, a)
    }

    fn contact_down(&mut self, a: NodeId, b: NodeId) {
        let key = link(a, b);
        let Some(open) = self.links.get_mut(&key) else {
            return;
        };
        *open -= 1;
        if *open == 0 {
            self.links.remove(&key);
            let aborted = self.queue.invalidate_link(a, b);
            self.report.aborted += aborted as u64;
        }
    }

    /// Runs one direction of a contact through the forwarding pipeline.
    #[allow(clippy::cast_precision_loss)]
    fn offer(&mut self, now: Time, sender: NodeId, receiver: NodeId) -> Result<(), Fatal> {
        let greedy = self.protocol.forwarding == ForwardingRule::Greedy;
        let window = self.protocol.history_window;

        let tx = self.node(sender)?;
        let sender_length = tx.store.len(now);
        let mut offers = Vec::new();
        for id in tx.store.all_native(now) {
            let destination = tx.store.destination(now, id)?;
            let remaining_ttl = tx.store.remaining_ttl(now, id)?;
            offers.push((id, destination, remaining_ttl, tx.utility_for(destination)));
        }
        offers.retain(|(id, ..)| !self.in_flight.contains(&(receiver, *id)));

        let rx = self.node(receiver)?;
        let state = rx.receiver_state(now, sender_length, window);
        let mut infos = Vec::new();
        for (packet, destination, remaining_ttl, sender_utility) in offers {
            if rx.store.exists(now, packet) || rx.has_received(packet) {
                continue;
            }
            let receiver_utility = rx.utility_for(destination);
            if greedy && receiver_utility <= sender_utility {
                continue;
            }
            infos.push(PacketInfo {
                packet,
                remaining_ttl,
                sender_utility,
                receiver_utility,
            });
        }
        if infos.is_empty() {
            return Ok(());
        }

        let tx = self.node(sender)?;
        let positions = tx.store.positions(now);
        for info in &infos {
            let hint = UtilityHint::new(info.sender_utility, info.receiver_utility);
            tx.scheduler.add(info.packet, Some(hint));
        }
        let Some(order) = tx.scheduler.compute_order(&positions)? else {
            return Ok(());
        };
        tx.congestion.record_receiver_state(state);
        for info in infos {
            tx.congestion.add_packet_info(info);
        }
        let Some(admitted) = tx.congestion.filter_packets(&order)? else {
            log!(self.logger, "{now}: {receiver} admitted nothing from {sender}");
            return Ok(());
        };
        log!(
            self.logger,
            "{now}: {sender} -> {receiver}: {} offered, {} admitted",
            order.len(),
            admitted.len()
        );
        for (k, packet) in admitted.into_iter().enumerate() {
            let at = now + (k + 1) as Float * self.protocol.transmission_time;
            self.queue.insert(Event::new(
                at,
                EventKind::Transmission {
                    sender,
                    receiver,
                    packet,
                    valid: true,
                },
            ))?;
            self.in_flight.insert((receiver, packet));
        }
        Ok(())
    }

    fn transmission(
        &mut self,
        now: Time,
        sender: NodeId,
        receiver: NodeId,
        packet: PacketId,
        valid: bool,
    ) -> Result<(), Fatal> {
        self.node(receiver)?;
        self.in_flight.remove(&(receiver, packet));
        if !valid {
            return Ok(());
        }
        let tx = self.node(sender)?;
        if !tx.store.exists(now, packet) {
            log!(self.logger, "{now}: {packet} left {sender} before it could be sent");
            return Ok(());
        }
        let fields = tx.store.fields(now, packet)?.clone();
        tx.store.mark_forwarded(now, packet)?;
        tx.store.add_forwarder(now, packet, receiver)?;
        let arrived = fields.destination == receiver;
        if arrived {
            tx.store.remove(now, packet);
        }
        self.report.transmitted += 1;

        if arrived {
            if self.node(receiver)?.deliver(packet) {
                self.report.delivered += 1;
                self.latency.record(now - fields.created);
                log!(self.logger, "{now}: {packet} delivered to {receiver}");
            }
            return Ok(());
        }
        let rx = self.node(receiver)?;
        if rx.store.exists(now, packet) || rx.has_received(packet) {
            return Ok(());
        }
        rx.store.insert(now, fields.relayed_by(sender))
    }

    fn finish(&mut self) -> SimulationReport {
        let mut report = self.report.clone();
        for node in self.nodes.values_mut() {
            node.store.remove_expired(self.end);
            let counters = node.store.counters();
            let stats = node.store.drop_stats();
            report.dropped += counters.dropped;
            report.expired += counters.expired;
            report.dropped_source += stats.source;
            report.dropped_relayed += stats.relayed;
        }
        report.mean_latency = self.latency.value().ok();
        report
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        config::{BufferConfig, ForwardingRule, PolicyConfig, SimulationConfig},
        congestion::CongestionControlKind,
        dropping::DroppingPolicyKind,
        error::Fatal,
        event::{Event, EventKind},
        packet::{NodeId, PacketId},
        quantities::{seconds, Time},
        scheduling::SchedulingPolicyKind,
        synthetic::Trace,
        util::logging::{MemoryLogger, NothingLogger},
    };

    use super::{SimulationReport, Simulator};

    fn config(nodes: usize, forwarding: ForwardingRule) -> SimulationConfig {
        let mut config = SimulationConfig {
            nodes,
            duration: seconds(100.),
            buffer: BufferConfig {
                capacity: 10,
                ttl: seconds(0.),
                recording: false,
            },
            policies: PolicyConfig {
                dropping: DroppingPolicyKind::DropFront,
                scheduling: SchedulingPolicyKind::Fifo,
                congestion: CongestionControlKind::None,
            },
            ..SimulationConfig::default()
        };
        config.protocol.forwarding = forwarding;
        config.protocol.transmission_time = seconds(1.);
        config
    }

    fn at(t: f64, kind: EventKind) -> Event {
        Event::new(Time::from_sim_start(t), kind)
    }

    fn generate(t: f64, source: usize, destination: usize, packet: u64) -> Event {
        at(
            t,
            EventKind::PacketGeneration {
                source: NodeId(source),
                destination: NodeId(destination),
                packet: PacketId(packet),
                valid: true,
            },
        )
    }

    fn contact(up: f64, down: f64, a: usize, b: usize) -> [Event; 2] {
        let (a, b) = (NodeId(a), NodeId(b));
        [
            at(up, EventKind::ContactUp { a, b }),
            at(down, EventKind::ContactDown { a, b }),
        ]
    }

    fn trace(events: Vec<Event>) -> Trace {
        Trace {
            events,
            contacts: 0,
            packets: 0,
        }
    }

    fn simulate(config: &SimulationConfig, events: Vec<Event>) -> Simulator {
        Simulator::from_trace(config, trace(events), |_| NothingLogger).unwrap()
    }

    #[test]
    fn direct_delivery() {
        let mut events = vec![generate(1., 0, 1, 0)];
        events.extend(contact(5., 20., 0, 1));
        let mut sim = simulate(&config(2, ForwardingRule::Epidemic), events);
        let report = sim.run().unwrap();
        assert_eq!(
            report,
            SimulationReport {
                events: 4,
                contacts: 1,
                generated: 1,
                delivered: 1,
                transmitted: 1,
                mean_latency: Some(seconds(5.)),
                ..SimulationReport::default()
            }
        );
        assert_eq!(report.delivery_ratio(), 1.);
        let now = Time::from_sim_start(30.);
        assert!(!sim.node(NodeId(0)).unwrap().store.exists(now, PacketId(0)));
        assert!(sim.node(NodeId(1)).unwrap().has_received(PacketId(0)));
    }

    #[test]
    fn short_contact_aborts_transfer() {
        let mut events = vec![generate(1., 0, 1, 0)];
        events.extend(contact(5., 5.5, 0, 1));
        let report = simulate(&config(2, ForwardingRule::Epidemic), events)
            .run()
            .unwrap();
        assert_eq!(report.aborted, 1);
        assert_eq!(report.transmitted, 0);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.mean_latency, None);
    }

    fn relay_trace() -> Vec<Event> {
        let mut events = vec![generate(1., 0, 2, 0)];
        events.extend(contact(5., 10., 0, 1));
        events.extend(contact(20., 30., 1, 2));
        events
    }

    #[test]
    fn epidemic_relays_through_carriers() {
        let mut sim = simulate(&config(3, ForwardingRule::Epidemic), relay_trace());
        let report = sim.run().unwrap();
        assert_eq!(report.transmitted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.mean_latency, Some(seconds(20.)));
        let now = Time::from_sim_start(30.);
        let source = sim.node(NodeId(0)).unwrap();
        assert_eq!(source.store.was_forwarded(now, PacketId(0)), Ok(true));
        assert_eq!(
            source.store.forwarded_to(now, PacketId(0), NodeId(1)),
            Ok(true)
        );
        assert!(!sim.node(NodeId(1)).unwrap().store.exists(now, PacketId(0)));
    }

    #[test]
    fn greedy_waits_for_a_better_carrier() {
        let report = simulate(&config(3, ForwardingRule::Greedy), relay_trace())
            .run()
            .unwrap();
        assert_eq!(report.transmitted, 0);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.delivery_ratio(), 0.);
    }

    #[test]
    fn overlapping_contacts_share_a_link() {
        let mut events = vec![generate(1., 0, 1, 0)];
        events.extend(contact(5., 5.5, 0, 1));
        events.extend(contact(5.2, 9., 1, 0));
        let report = simulate(&config(2, ForwardingRule::Epidemic), events)
            .run()
            .unwrap();
        assert_eq!(report.contacts, 1);
        assert_eq!(report.aborted, 0);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn unknown_nodes_are_fatal() {
        let mut sim = simulate(
            &config(2, ForwardingRule::Epidemic),
            vec![generate(1., 0, 5, 0)],
        );
        assert_eq!(sim.run(), Err(Fatal::UnknownNode(NodeId(5))));
    }

    #[test]
    fn events_are_logged() {
        let mut events = vec![generate(1., 0, 1, 0)];
        events.extend(contact(5., 20., 0, 1));
        let mut sim = Simulator::from_trace(
            &config(2, ForwardingRule::Epidemic),
            trace(events),
            |_| MemoryLogger::new(),
        )
        .unwrap();
        sim.run().unwrap();
        let lines = sim.logger().lines();
        assert!(lines.iter().any(|l| l.ends_with("contact up n0-n1")));
        assert!(lines.iter().any(|l| l.ends_with("#0 delivered to n1")));
        let node = sim.node(NodeId(0)).unwrap();
        assert!(node.store.logger().lines()[0].contains("inserted #0"));
    }
}
