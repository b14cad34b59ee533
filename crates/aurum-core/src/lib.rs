//! Core of aurum: gold price acquisition.
//!
//! This crate contains:
//! - Canonical bar, series and spot quote models with validation
//! - Provider identifiers, adapter contract and the built-in adapters
//! - Quality scoring of candidate series
//! - Durable snapshot cache
//! - The acquisition orchestrator and the spot fallback chain
//! - Return statistics derived from a series

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod orchestrator;
pub mod provider_policy;
pub mod quality;
pub mod realtime;
pub mod returns;
pub mod source;
pub mod testing;
pub mod throttling;

pub use adapters::{
    default_adapters, AlphaVantageAdapter, FinnhubAdapter, KitcoAdapter, SinaAdapter, YahooAdapter,
};
pub use cache::{is_stale, CacheMode, CacheSnapshot, CacheStore, FileCacheStore, MemoryCacheStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AcquisitionConfig, ProviderCredentials};
pub use data_source::{
    AdapterDescriptor, CapabilitySet, Endpoint, SourceAdapter, SourceError, SourceErrorKind,
};
pub use domain::{
    format_iso_date, parse_iso_date, CanonicalBar, CanonicalSeries, ColumnSet, QuoteProvenance,
    SeriesKey, SpotQuote, UtcDateTime,
};
pub use error::{CacheError, CoreError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use orchestrator::{
    AcquisitionOrchestrator, AcquisitionReport, AcquisitionState, AttemptOutcome, AttemptRecord,
    CacheCheck, LatestSeries, OrchestratorBuilder, SeriesOrigin,
};
pub use provider_policy::ProviderPolicy;
pub use quality::{QualityIssue, QualityPolicy, QualityReport, QualityScorer};
pub use realtime::RealtimeResolver;
pub use returns::BarReturns;
pub use source::ProviderId;
pub use throttling::RateBudget;
