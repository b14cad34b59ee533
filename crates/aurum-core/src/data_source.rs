//! Source adapter contract and adapter-level error types.
//!
//! Every external provider is wrapped in one [`SourceAdapter`]. An adapter
//! normalizes its provider's payload into the canonical schema and reports
//! anything that went wrong as a [`SourceError`] value. Provider failure is
//! an expected, frequent outcome: the orchestrator records it and moves on
//! to the next adapter, it never propagates past the orchestrator.
//!
//! # Endpoints
//!
//! | Endpoint | Method | Output |
//! |----------|--------|--------|
//! | Series | [`SourceAdapter::fetch_series`] | [`CanonicalSeries`] (may be empty) |
//! | Spot | [`SourceAdapter::fetch_spot`] | [`SpotQuote`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CanonicalSeries, ProviderId, SpotQuote};

/// Data endpoint type used for capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Series,
    Spot,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Spot => "spot",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub series: bool,
    pub spot: bool,
}

impl CapabilitySet {
    pub const fn new(series: bool, spot: bool) -> Self {
        Self { series, spot }
    }

    pub const fn series_only() -> Self {
        Self::new(true, false)
    }

    pub const fn spot_only() -> Self {
        Self::new(false, true)
    }

    pub const fn full() -> Self {
        Self::new(true, true)
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Series => self.series,
            Endpoint::Spot => self.spot,
        }
    }

    pub fn supported_endpoints(self) -> Vec<&'static str> {
        let mut values = Vec::with_capacity(2);
        if self.series {
            values.push(Endpoint::Series.as_str());
        }
        if self.spot {
            values.push(Endpoint::Spot.as_str());
        }
        values
    }
}

/// Static description of an adapter, fixed when the adapter is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    pub provider: ProviderId,
    /// Lower is tried first.
    pub priority: u8,
    pub capabilities: CapabilitySet,
}

impl AdapterDescriptor {
    pub const fn new(provider: ProviderId, priority: u8, capabilities: CapabilitySet) -> Self {
        Self {
            provider,
            priority,
            capabilities,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.provider.as_str()
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    UnsupportedEndpoint,
    NotConfigured,
    Unavailable,
    RateLimited,
    Malformed,
    Internal,
}

/// Structured adapter error. Recorded by the orchestrator, never raised to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unsupported_endpoint(endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by this source"),
            retryable: false,
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by adapter endpoints.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the orchestrator shares them
/// behind `Arc` across acquisition cycles.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use aurum_core::{AdapterDescriptor, CapabilitySet, ProviderId, SourceAdapter};
///
/// struct MyAdapter;
///
/// impl SourceAdapter for MyAdapter {
///     fn descriptor(&self) -> AdapterDescriptor {
///         AdapterDescriptor::new(ProviderId::Kitco, 2, CapabilitySet::series_only())
///     }
///
///     fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
///         Box::pin(async move { /* ... */ })
///     }
/// }
/// ```
pub trait SourceAdapter: Send + Sync {
    /// Returns the adapter's fixed descriptor.
    fn descriptor(&self) -> AdapterDescriptor;

    /// Fetches up to `lookback_days` of daily bars.
    ///
    /// An empty series is a legitimate "no data" answer.
    fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries>;

    /// Fetches the current spot quote.
    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        Box::pin(async { Err(SourceError::unsupported_endpoint(Endpoint::Spot)) })
    }
}
