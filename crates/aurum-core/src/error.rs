use thiserror::Error;

/// Validation and contract errors exposed by `aurum-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid source '{value}', expected one of sina, kitco, alphavantage, finnhub, yahoo")]
    InvalidSource { value: String },

    #[error("series key must be 1-64 characters of [A-Za-z0-9_.-]: '{value}'")]
    InvalidSeriesKey { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("calendar date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar dated {date} does not follow the newest bar dated {newest}")]
    BarOutOfOrder { date: String, newest: String },
}

/// Failures of the durable snapshot store.
///
/// The orchestrator never aborts on these; a failed read is a cache miss and a
/// failed write is logged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache task failed: {0}")]
    Task(String),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
