use std::env;

use clap::ValueEnum;
use tracing::Level;

use crate::cli::LogLevel;

const LOG_ENV: &str = "AURUM_LOG";

/// Installs the stderr subscriber. The flag wins over `AURUM_LOG`; the default is `warn`.
pub fn init(flag: Option<LogLevel>) {
    let level = flag
        .or_else(|| {
            env::var(LOG_ENV)
                .ok()
                .and_then(|raw| LogLevel::from_str(raw.trim(), true).ok())
        })
        .unwrap_or(LogLevel::Warn);

    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
