use std::path::Path;

use adyton::{config::SimulationConfig, Config};
use anyhow::Result;

pub(super) fn create_config(output: &Path) -> Result<()> {
    SimulationConfig::default().save(output)
}
