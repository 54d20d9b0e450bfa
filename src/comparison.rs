use indicatif::{ParallelProgressIterator, ProgressBar};
use itertools::iproduct;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    config::{PolicyConfig, SimulationConfig},
    congestion::CongestionControlKind,
    dropping::DroppingPolicyKind,
    error::Fatal,
    scheduling::SchedulingPolicyKind,
    simulation::{SimulationReport, Simulator},
    util::logging::NothingLogger,
};

/// How one policy combination fared on a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub policies: PolicyConfig,
    pub report: SimulationReport,
}

/// Every combination of dropping, scheduling and congestion control policy.
#[must_use]
pub fn all_policies() -> Vec<PolicyConfig> {
    iproduct!(
        DroppingPolicyKind::ALL,
        SchedulingPolicyKind::ALL,
        CongestionControlKind::ALL
    )
    .map(|(dropping, scheduling, congestion)| PolicyConfig {
        dropping,
        scheduling,
        congestion,
    })
    .collect()
}

/// Runs `base` once per policy combination on the same trace.
///
/// Combinations the scenario cannot support are skipped. Trials come back
/// in the order of `policies`.
pub fn compare(
    base: &SimulationConfig,
    policies: Vec<PolicyConfig>,
    progress: ProgressBar,
) -> Result<Vec<Trial>, Fatal> {
    let configs: Vec<_> = policies
        .into_iter()
        .map(|policies| SimulationConfig {
            policies,
            ..base.clone()
        })
        .filter(|config| config.validate().is_ok())
        .collect();
    progress.set_length(configs.len() as u64);
    configs
        .into_par_iter()
        .progress_with(progress)
        .map(|config| -> Result<Trial, Fatal> {
            let report = Simulator::new(&config, |_| NothingLogger::new())?.run()?;
            Ok(Trial {
                policies: config.policies,
                report,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressBar;

    use crate::{
        config::{ForwardingRule, SimulationConfig},
        quantities::seconds,
        scheduling::SchedulingPolicyKind,
        simulation::Simulator,
        util::logging::NothingLogger,
    };

    use super::{all_policies, compare};

    #[test]
    fn covers_every_combination() {
        let policies = all_policies();
        assert_eq!(policies.len(), 8 * 5 * 4);
        for (i, a) in policies.iter().enumerate() {
            assert!(!policies[i + 1..].contains(a));
        }
    }

    #[test]
    fn trials_match_individual_runs() {
        let mut base = SimulationConfig {
            seed: 17,
            nodes: 5,
            duration: seconds(1_000.),
            ..SimulationConfig::default()
        };
        base.protocol.forwarding = ForwardingRule::Epidemic;
        let policies: Vec<_> = all_policies().into_iter().step_by(7).collect();
        let trials = compare(&base, policies.clone(), ProgressBar::hidden()).unwrap();
        let supported = policies
            .iter()
            .filter(|p| p.scheduling != SchedulingPolicyKind::Hnuv)
            .count();
        assert_eq!(trials.len(), supported);
        for trial in trials {
            let config = SimulationConfig {
                policies: trial.policies,
                ..base.clone()
            };
            let report = Simulator::new(&config, |_| NothingLogger::new())
                .unwrap()
                .run()
                .unwrap();
            assert_eq!(trial.report, report);
        }
    }
}
