use aurum_core::{AcquisitionOrchestrator, AcquisitionReport, AttemptOutcome, CacheMode};

use crate::cli::SeriesArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &SeriesArgs,
    orchestrator: &AcquisitionOrchestrator,
) -> Result<CommandResult, CliError> {
    let lookback_days = args
        .lookback_days
        .unwrap_or(orchestrator.config().lookback_days);
    if lookback_days == 0 {
        return Err(CliError::Command(String::from(
            "--lookback-days must be at least 1",
        )));
    }
    let mode = if args.no_cache {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    };

    let report = orchestrator.acquire_with(lookback_days, mode).await;
    let warnings = attempt_warnings(&report);
    let data = serde_json::to_value(&report)?;

    let result = if report.is_exhausted() {
        CommandResult::absent(data)
    } else {
        CommandResult::ok(data)
    };
    Ok(result.with_warnings(warnings))
}

/// One line per provider that did not contribute.
fn attempt_warnings(report: &AcquisitionReport) -> Vec<String> {
    report
        .attempts
        .iter()
        .filter_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Failed { code, message } => {
                Some(format!("{}: {code}: {message}", attempt.provider))
            }
            AttemptOutcome::TimedOut => Some(format!("{}: timed out", attempt.provider)),
            AttemptOutcome::Empty => Some(format!("{}: no data", attempt.provider)),
            AttemptOutcome::Rejected { report } => Some(format!(
                "{}: rejected with quality score {}",
                attempt.provider, report.score
            )),
            AttemptOutcome::Accepted { .. } => None,
        })
        .collect()
}
