use aurum_core::{
    format_iso_date, is_stale, AcquisitionOrchestrator, FileCacheStore, SeriesKey, UtcDateTime,
};
use serde::Serialize;
use serde_json::json;

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SnapshotSummary {
    series_key: SeriesKey,
    written_at: UtcDateTime,
    age_seconds: u64,
    stale: bool,
    bars: usize,
    first_date: Option<String>,
    last_date: Option<String>,
}

pub async fn run(
    args: &CacheArgs,
    orchestrator: &AcquisitionOrchestrator,
) -> Result<CommandResult, CliError> {
    let config = orchestrator.config();
    match args.command {
        CacheCommand::Path => {
            let path = FileCacheStore::new(config.cache_dir.clone()).snapshot_path(&config.series_key);
            Ok(CommandResult::ok(json!({
                "series_key": config.series_key,
                "path": path.display().to_string(),
                "exists": path.exists(),
            })))
        }
        CacheCommand::Show => {
            let Some(snapshot) = orchestrator.cached_snapshot().await? else {
                return Ok(CommandResult::absent(json!({ "series_key": config.series_key }))
                    .with_warnings(vec![String::from("no snapshot stored")]));
            };

            let now = orchestrator.now();
            let summary = SnapshotSummary {
                series_key: config.series_key.clone(),
                written_at: snapshot.written_at,
                age_seconds: now.elapsed_since(snapshot.written_at).as_secs(),
                stale: is_stale(&snapshot, config.cache_ttl, now),
                bars: snapshot.series.len(),
                first_date: snapshot.series.first().map(|bar| format_iso_date(bar.date)),
                last_date: snapshot.series.last().map(|bar| format_iso_date(bar.date)),
            };
            Ok(CommandResult::ok(serde_json::to_value(summary)?))
        }
    }
}
