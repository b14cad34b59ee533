use serde::Serialize;
use serde_json::Value;

use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Rendered<'a> {
    data: &'a Value,
    #[serde(skip_serializing_if = "no_warnings")]
    warnings: &'a [String],
}

fn no_warnings(warnings: &&[String]) -> bool {
    warnings.is_empty()
}

/// Writes the command result to stdout as a single JSON document.
pub fn render(result: &CommandResult, pretty: bool) -> Result<(), CliError> {
    let rendered = Rendered {
        data: &result.data,
        warnings: &result.warnings,
    };
    let payload = if pretty {
        serde_json::to_string_pretty(&rendered)?
    } else {
        serde_json::to_string(&rendered)?
    };
    println!("{payload}");
    Ok(())
}
