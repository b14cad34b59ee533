use aurum_core::{AcquisitionOrchestrator, AdapterDescriptor, ProviderId};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SourceStatus {
    id: ProviderId,
    priority: u8,
    capabilities: Vec<&'static str>,
}

impl From<AdapterDescriptor> for SourceStatus {
    fn from(descriptor: AdapterDescriptor) -> Self {
        Self {
            id: descriptor.provider,
            priority: descriptor.priority,
            capabilities: descriptor.capabilities.supported_endpoints(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub fn run(orchestrator: &AcquisitionOrchestrator) -> Result<CommandResult, CliError> {
    let sources = orchestrator
        .descriptors()
        .into_iter()
        .map(SourceStatus::from)
        .collect();

    let data = serde_json::to_value(SourcesResponseData { sources })?;
    Ok(CommandResult::ok(data))
}
