use adyton::{
    config::{ForwardingRule, SimulationConfig},
    congestion::CongestionControlKind,
    dropping::DroppingPolicyKind,
    quantities::seconds,
    scheduling::SchedulingPolicyKind,
    simulation::{SimulationReport, Simulator},
    util::logging::NothingLogger,
};
use pretty_assertions::assert_eq;

fn run(config: &SimulationConfig) -> SimulationReport {
    Simulator::new(config, |_| NothingLogger::new())
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn same_seed_same_report() {
    let config = SimulationConfig {
        seed: 1234,
        duration: seconds(3_000.),
        ..SimulationConfig::default()
    };
    let report = run(&config);
    assert_eq!(report, run(&config));
    assert!(report.generated > 0);
    assert!(report.delivered <= report.generated);
    assert!(report.transmitted >= report.delivered);
}

#[test]
fn every_policy_combination_completes() {
    let mut base = SimulationConfig {
        seed: 99,
        nodes: 6,
        duration: seconds(1_500.),
        ..SimulationConfig::default()
    };
    base.buffer.capacity = 4;
    base.buffer.ttl = seconds(400.);
    for forwarding in [ForwardingRule::Epidemic, ForwardingRule::Greedy] {
        for dropping in DroppingPolicyKind::ALL {
            for scheduling in SchedulingPolicyKind::ALL {
                for congestion in CongestionControlKind::ALL {
                    let mut config = base.clone();
                    config.protocol.forwarding = forwarding;
                    config.policies.dropping = dropping;
                    config.policies.scheduling = scheduling;
                    config.policies.congestion = congestion;
                    if config.validate().is_err() {
                        continue;
                    }
                    let report = run(&config);
                    assert!(
                        report.delivered <= report.generated,
                        "{:?}",
                        config.policies
                    );
                }
            }
        }
    }
}

#[test]
fn small_buffers_drop_packets() {
    let mut config = SimulationConfig {
        seed: 5,
        duration: seconds(3_000.),
        ..SimulationConfig::default()
    };
    config.protocol.forwarding = ForwardingRule::Epidemic;
    config.policies.scheduling = SchedulingPolicyKind::Fifo;
    config.policies.congestion = CongestionControlKind::None;
    config.buffer.capacity = 2;
    let report = run(&config);
    assert!(report.dropped > 0);
    assert_eq!(report.dropped, report.dropped_source + report.dropped_relayed);
}
