use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use compare::compare;
use create_config::create_config;
use run::run;

mod compare;
mod create_config;
mod run;

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a default simulation config file
    GenConfig {
        /// File to write the simulation config to
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Simulate a scenario and print delivery statistics
    Run {
        /// Simulation config file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Log every event and buffer operation
        #[arg(short, long)]
        verbose: bool,

        /// File to write the report to (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a scenario under every policy combination and rank them
    Compare {
        /// Simulation config file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// File to write every trial to (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate opportunistic networks with pluggable buffer, scheduling and admission policies.", long_about = None)]
struct Args {
    #[command(subcommand)]
    pub command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::GenConfig { output } => create_config(&output),
        Command::Run {
            config,
            verbose,
            output,
        } => run(&config, verbose, output.as_deref()),
        Command::Compare { config, output } => compare(&config, output.as_deref()),
    }
}
