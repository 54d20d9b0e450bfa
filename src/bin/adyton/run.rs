use std::path::Path;

use adyton::{
    config::SimulationConfig,
    simulation::{SimulationReport, Simulator},
    util::logging::{Logger, NothingLogger, PrintLogger},
    Config,
};
use anyhow::Result;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row {
    metric: &'static str,
    value: String,
}

fn simulate<L: Logger>(
    config: &SimulationConfig,
    loggers: impl FnMut(&str) -> L,
) -> Result<SimulationReport> {
    let mut simulator = Simulator::new(config, loggers)?;
    Ok(simulator.run()?)
}

fn rows(report: &SimulationReport) -> Vec<Row> {
    let row = |metric, value: &dyn ToString| Row {
        metric,
        value: value.to_string(),
    };
    vec![
        row("events", &report.events),
        row("contacts", &report.contacts),
        row("generated", &report.generated),
        row("delivered", &report.delivered),
        row("delivery ratio", &format!("{:.4}", report.delivery_ratio())),
        row(
            "mean latency",
            &report
                .mean_latency
                .map_or_else(|| "-".to_owned(), |l| l.to_string()),
        ),
        row("transmitted", &report.transmitted),
        row("aborted", &report.aborted),
        row("dropped (source)", &report.dropped_source),
        row("dropped (relayed)", &report.dropped_relayed),
        row("expired", &report.expired),
    ]
}

pub(super) fn run(config: &Path, verbose: bool, output: Option<&Path>) -> Result<()> {
    let config = SimulationConfig::load(config)?;
    config.validate()?;
    let report = if verbose {
        simulate(&config, |name| PrintLogger::new(name.to_owned()))?
    } else {
        simulate(&config, |_| NothingLogger::new())?
    };
    println!("{}", Table::new(rows(&report)));
    if let Some(output) = output {
        report.save(output)?;
    }
    Ok(())
}
