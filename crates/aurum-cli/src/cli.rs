//! CLI argument definitions for aurum.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `series` | Acquire the daily gold series and print the acquisition report |
//! | `latest` | Acquired series plus today's bar from a live quote, with returns |
//! | `spot` | Current spot price, live or derived from the newest bar |
//! | `sources` | Registered adapters in the order they are tried |
//! | `cache` | Inspect the stored snapshot |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--cache-dir` | `data_cache` | Snapshot directory (`AURUM_CACHE_DIR`) |
//! | `--ttl-hours` | `24` | Snapshot freshness window (`AURUM_CACHE_TTL_HOURS`) |
//! | `--timeout-secs` | `10` | Bound on a single provider call (`AURUM_ADAPTER_TIMEOUT_SECS`) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `warn` | Diagnostics on stderr (`AURUM_LOG`) |
//!
//! # Examples
//!
//! ```bash
//! aurum series --lookback-days 90 --pretty
//! aurum spot
//! aurum cache show
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

/// Gold price acquisition with quality scoring, caching and spot fallback.
#[derive(Debug, Parser)]
#[command(name = "aurum", author, version, about)]
pub struct Cli {
    /// Directory holding cached snapshots.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Hours a snapshot stays fresh.
    #[arg(long, global = true)]
    pub ttl_hours: Option<u64>,

    /// Upper bound on one provider call, in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log verbosity on stderr.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Acquire the daily series and print the acquisition report.
    Series(SeriesArgs),
    /// Print the series with today's bar appended from the spot quote.
    Latest,
    /// Print the current spot price.
    Spot,
    /// List adapters in priority order.
    Sources,
    /// Inspect the snapshot cache.
    Cache(CacheArgs),
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Number of most recent trading days to return.
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Ignore the stored snapshot; the fetched series still replaces it.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Snapshot metadata and staleness.
    Show,
    /// Path of the snapshot file.
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "aurum",
            "series",
            "--lookback-days",
            "90",
            "--no-cache",
            "--cache-dir",
            "/tmp/aurum",
            "--pretty",
        ])
        .expect("valid arguments");

        assert!(cli.pretty);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/aurum")));
        match cli.command {
            Command::Series(args) => {
                assert_eq!(args.lookback_days, Some(90));
                assert!(args.no_cache);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cache_requires_an_action() {
        assert!(Cli::try_parse_from(["aurum", "cache"]).is_err());
        let cli = Cli::try_parse_from(["aurum", "cache", "path"]).expect("valid arguments");
        assert!(matches!(
            cli.command,
            Command::Cache(CacheArgs {
                command: CacheCommand::Path
            })
        ));
    }

    #[test]
    fn log_level_flag_maps_to_tracing_level() {
        let cli = Cli::try_parse_from(["aurum", "--log-level", "debug", "spot"])
            .expect("valid arguments");
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }
}
