use aurum_core::AcquisitionOrchestrator;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(orchestrator: &AcquisitionOrchestrator) -> Result<CommandResult, CliError> {
    let latest = orchestrator.latest_series().await;
    let empty = latest.series.is_empty();
    let data = serde_json::to_value(&latest)?;

    if empty {
        return Ok(CommandResult::absent(data)
            .with_warnings(vec![String::from("no usable series from cache or providers")]));
    }
    let mut warnings = Vec::new();
    if latest.appended.as_ref().is_some_and(|quote| !quote.is_live()) {
        warnings.push(String::from("no live quote, today's bar repeats the newest close"));
    }
    Ok(CommandResult::ok(data).with_warnings(warnings))
}
