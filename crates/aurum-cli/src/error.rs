use thiserror::Error;

/// Exit code when the command ran but had nothing to report (no series, no spot price).
pub const DATA_ABSENT_EXIT_CODE: u8 = 3;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] aurum_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Cache(#[from] aurum_core::CacheError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Cache(_) => 5,
            Self::Io(_) => 10,
        }
    }
}
