mod cache;
mod latest;
mod series;
mod sources;
mod spot;

use std::time::Duration;

use aurum_core::{AcquisitionConfig, AcquisitionOrchestrator, ProviderCredentials};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

const SECONDS_PER_HOUR: u64 = 60 * 60;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    /// The command succeeded but found nothing to report.
    pub data_absent: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            data_absent: false,
        }
    }

    pub fn absent(data: Value) -> Self {
        Self {
            data_absent: true,
            ..Self::ok(data)
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = config_from(cli);

    match &cli.command {
        Command::Sources => sources::run(&orchestrator(config)),
        Command::Cache(args) => cache::run(args, &orchestrator(config)).await,
        Command::Series(args) => series::run(args, &orchestrator(config)).await,
        Command::Latest => latest::run(&orchestrator(config)).await,
        Command::Spot => spot::run(&orchestrator(config)).await,
    }
}

/// Environment overlaid with the global flags.
fn config_from(cli: &Cli) -> AcquisitionConfig {
    let mut config = AcquisitionConfig::from_env();
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_dir(dir.clone());
    }
    if let Some(hours) = cli.ttl_hours {
        config = config.with_cache_ttl(Duration::from_secs(hours.saturating_mul(SECONDS_PER_HOUR)));
    }
    if let Some(seconds) = cli.timeout_secs {
        config = config.with_adapter_timeout(Duration::from_secs(seconds));
    }
    config
}

fn orchestrator(config: AcquisitionConfig) -> AcquisitionOrchestrator {
    AcquisitionOrchestrator::from_config(config, &ProviderCredentials::from_env())
}
