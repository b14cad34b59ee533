use aurum_core::AcquisitionOrchestrator;
use serde_json::Value;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(orchestrator: &AcquisitionOrchestrator) -> Result<CommandResult, CliError> {
    match orchestrator.get_spot().await {
        Some(quote) => {
            let warnings = if quote.is_live() {
                Vec::new()
            } else {
                vec![String::from("no live quote, price derived from the newest bar")]
            };
            Ok(CommandResult::ok(serde_json::to_value(&quote)?).with_warnings(warnings))
        }
        None => Ok(CommandResult::absent(Value::Null)
            .with_warnings(vec![String::from("no spot price available")])),
    }
}
