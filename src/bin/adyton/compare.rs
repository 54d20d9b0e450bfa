use std::path::Path;

use adyton::{
    comparison::{self, all_policies, Trial},
    config::SimulationConfig,
    Config,
};
use anyhow::Result;
use indicatif::ProgressBar;
use itertools::Itertools;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row {
    dropping: String,
    scheduling: String,
    congestion: String,
    #[tabled(rename = "delivery ratio")]
    delivery_ratio: String,
    delivered: u64,
    transmitted: u64,
    dropped: u64,
}

impl From<&Trial> for Row {
    fn from(trial: &Trial) -> Row {
        Row {
            dropping: format!("{:?}", trial.policies.dropping),
            scheduling: format!("{:?}", trial.policies.scheduling),
            congestion: format!("{:?}", trial.policies.congestion),
            delivery_ratio: format!("{:.4}", trial.report.delivery_ratio()),
            delivered: trial.report.delivered,
            transmitted: trial.report.transmitted,
            dropped: trial.report.dropped,
        }
    }
}

pub(super) fn compare(config: &Path, output: Option<&Path>) -> Result<()> {
    let config = SimulationConfig::load(config)?;
    config.validate()?;
    let trials = comparison::compare(&config, all_policies(), ProgressBar::new(0))?;
    let ranked = trials
        .iter()
        .sorted_by(|a, b| {
            b.report
                .delivery_ratio()
                .total_cmp(&a.report.delivery_ratio())
                .then(a.report.transmitted.cmp(&b.report.transmitted))
        })
        .map(Row::from)
        .collect_vec();
    println!("{}", Table::new(ranked));
    if let Some(output) = output {
        trials.save(output)?;
    }
    Ok(())
}
