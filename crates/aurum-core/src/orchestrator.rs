//! Acquisition orchestrator.
//!
//! One acquisition cycle walks `Init -> CacheCheck -> SourceScan -> Done`:
//!
//! 1. **CacheCheck** loads the snapshot of the series key. A snapshot that is
//!    fresh and scores as valid ends the cycle.
//! 2. **SourceScan** asks series-capable adapters in ascending priority,
//!    scores every non-empty candidate and keeps the highest score, earliest
//!    adapter on ties. A candidate at or above the early-exit score stops
//!    the scan.
//! 3. **Done** stores a valid best candidate and returns it. Without one the
//!    cycle returns an empty series; nothing is fabricated.
//!
//! Overlapping cycles for the same key are serialized. Adapter calls are
//! sequential and each one is bounded by the configured timeout.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::adapters::default_adapters;
use crate::cache::{is_stale, CacheMode, CacheSnapshot, CacheStore, FileCacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{AcquisitionConfig, ProviderCredentials};
use crate::data_source::{AdapterDescriptor, Endpoint, SourceAdapter};
use crate::error::CacheError;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::quality::{QualityReport, QualityScorer};
use crate::realtime::RealtimeResolver;
use crate::returns::{self, BarReturns};
use crate::{CanonicalBar, CanonicalSeries, ProviderId, SeriesKey, SpotQuote, UtcDateTime};

/// Phase of an acquisition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Init,
    CacheCheck,
    SourceScan,
    Done,
}

impl Display for AcquisitionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::CacheCheck => "cache_check",
            Self::SourceScan => "source_scan",
            Self::Done => "done",
        })
    }
}

/// Where the returned series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeriesOrigin {
    Cache,
    Provider { provider: ProviderId },
    /// No usable snapshot and no valid candidate; the series is empty.
    Exhausted,
}

/// Result of the cache check phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheCheck {
    Skipped,
    Miss,
    Stale { written_at: UtcDateTime },
    Invalid { written_at: UtcDateTime, report: QualityReport },
    Hit { written_at: UtcDateTime },
    Error { message: String },
}

/// What happened when one adapter was asked for a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Empty,
    Failed { code: String, message: String },
    TimedOut,
    /// Scored below the validity floor.
    Rejected { report: QualityReport },
    /// Scored at or above the validity floor.
    Accepted { report: QualityReport },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider: ProviderId,
    pub outcome: AttemptOutcome,
}

/// Full account of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    pub series_key: SeriesKey,
    pub series: CanonicalSeries,
    pub origin: SeriesOrigin,
    /// Score of the returned series; `None` when exhausted.
    pub quality: Option<QualityReport>,
    pub cache: CacheCheck,
    pub attempts: Vec<AttemptRecord>,
    pub latency_ms: u64,
}

impl AcquisitionReport {
    pub fn is_exhausted(&self) -> bool {
        self.origin == SeriesOrigin::Exhausted
    }
}

/// Acquired series with today's bar appended when a live quote allowed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSeries {
    pub origin: SeriesOrigin,
    pub series: CanonicalSeries,
    pub returns: Vec<BarReturns>,
    /// The quote today's bar was built from, if one was appended.
    pub appended: Option<SpotQuote>,
}

struct Candidate {
    provider: ProviderId,
    series: CanonicalSeries,
    report: QualityReport,
}

/// Builder for [`AcquisitionOrchestrator`].
pub struct OrchestratorBuilder {
    config: AcquisitionConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Option<Arc<dyn CacheStore>>,
    clock: Arc<dyn Clock>,
}

impl OrchestratorBuilder {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            adapters: Vec::new(),
            cache: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_adapters(mut self, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    /// Registers every built-in provider adapter over `http_client`.
    pub fn with_default_adapters(
        self,
        http_client: Arc<dyn HttpClient>,
        credentials: &ProviderCredentials,
    ) -> Self {
        let adapters = default_adapters(http_client, credentials, Arc::clone(&self.clock));
        self.with_adapters(adapters)
    }

    /// Defaults to a [`FileCacheStore`] under the configured cache directory.
    pub fn with_cache_store(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> AcquisitionOrchestrator {
        let mut adapters = self.adapters;
        // Stable: equal priorities keep registration order.
        adapters.sort_by_key(|adapter| adapter.descriptor().priority);

        let cache: Arc<dyn CacheStore> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(FileCacheStore::new(self.config.cache_dir.clone())),
        };
        let resolver =
            RealtimeResolver::new(&adapters, self.config.adapter_timeout, Arc::clone(&self.clock));

        AcquisitionOrchestrator {
            scorer: QualityScorer::new(self.config.quality.clone()),
            adapters,
            cache,
            resolver,
            clock: self.clock,
            config: self.config,
            key_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Cache-first, quality-scored series acquisition over prioritized adapters.
pub struct AcquisitionOrchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<dyn CacheStore>,
    scorer: QualityScorer,
    resolver: RealtimeResolver,
    clock: Arc<dyn Clock>,
    config: AcquisitionConfig,
    key_locks: Arc<RwLock<HashMap<SeriesKey, Arc<Mutex<()>>>>>,
}

impl AcquisitionOrchestrator {
    pub fn builder(config: AcquisitionConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    /// Production wiring: reqwest transport, every built-in adapter, file cache.
    pub fn from_config(config: AcquisitionConfig, credentials: &ProviderCredentials) -> Self {
        OrchestratorBuilder::new(config)
            .with_default_adapters(Arc::new(ReqwestHttpClient::new()), credentials)
            .build()
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn now(&self) -> UtcDateTime {
        self.clock.now()
    }

    /// Registered adapters in the order they are tried.
    pub fn descriptors(&self) -> Vec<AdapterDescriptor> {
        self.adapters.iter().map(|adapter| adapter.descriptor()).collect()
    }

    /// Current snapshot of the configured series key, stale or not.
    pub async fn cached_snapshot(&self) -> Result<Option<CacheSnapshot>, CacheError> {
        self.cache.load(&self.config.series_key).await
    }

    /// The acquired series, or an empty one when nothing usable exists.
    pub async fn get_series(&self, lookback_days: u32) -> CanonicalSeries {
        self.acquire(lookback_days).await.series
    }

    pub async fn acquire(&self, lookback_days: u32) -> AcquisitionReport {
        self.acquire_with(lookback_days, CacheMode::Use).await
    }

    pub async fn acquire_with(&self, lookback_days: u32, mode: CacheMode) -> AcquisitionReport {
        let key = self.config.series_key.clone();
        let lock = self.get_or_create_lock(&key).await;
        let _guard = lock.lock().await;

        let started = Instant::now();
        debug!(series_key = %key, state = %AcquisitionState::Init, lookback_days, ?mode, "acquisition started");

        debug!(series_key = %key, state = %AcquisitionState::CacheCheck);
        let (cache, cached) = self.check_cache(&key, lookback_days, mode).await;
        if let Some((series, report)) = cached {
            info!(series_key = %key, bars = series.len(), score = report.score, "serving cached series");
            debug!(series_key = %key, state = %AcquisitionState::Done);
            return AcquisitionReport {
                series_key: key,
                series,
                origin: SeriesOrigin::Cache,
                quality: Some(report),
                cache,
                attempts: Vec::new(),
                latency_ms: elapsed_ms(started),
            };
        }

        debug!(series_key = %key, state = %AcquisitionState::SourceScan);
        let (best, attempts) = self.scan_sources(lookback_days).await;

        debug!(series_key = %key, state = %AcquisitionState::Done);
        match best.filter(|candidate| candidate.report.valid) {
            Some(candidate) => {
                if mode.writes() {
                    if let Err(error) = self
                        .cache
                        .save_at(&key, &candidate.series, self.clock.now())
                        .await
                    {
                        warn!(series_key = %key, %error, "failed to store accepted series");
                    }
                }
                info!(
                    series_key = %key,
                    provider = %candidate.provider,
                    bars = candidate.series.len(),
                    score = candidate.report.score,
                    "accepted provider series"
                );

                AcquisitionReport {
                    series_key: key,
                    series: candidate.series,
                    origin: SeriesOrigin::Provider {
                        provider: candidate.provider,
                    },
                    quality: Some(candidate.report),
                    cache,
                    attempts,
                    latency_ms: elapsed_ms(started),
                }
            }
            None => {
                warn!(
                    series_key = %key,
                    attempts = attempts.len(),
                    "no usable snapshot and no valid provider series"
                );
                AcquisitionReport {
                    series_key: key,
                    series: CanonicalSeries::empty(),
                    origin: SeriesOrigin::Exhausted,
                    quality: None,
                    cache,
                    attempts,
                    latency_ms: elapsed_ms(started),
                }
            }
        }
    }

    /// Live spot quote, else one derived from the newest acquired bar.
    ///
    /// `None` only when no provider answers and no series is available.
    pub async fn get_spot(&self) -> Option<SpotQuote> {
        if let Some(quote) = self.resolver.resolve_live().await {
            return Some(quote);
        }

        let series = self.get_series(self.config.lookback_days).await;
        self.resolver.derive(series.last())
    }

    /// Acquired series plus today's bar built from the resolved spot quote.
    ///
    /// When no provider answers, the quote is derived from the newest bar and
    /// `appended` carries that provenance. The appended bar only lives in the
    /// returned value; the cache keeps the acquired series as it was.
    pub async fn latest_series(&self) -> LatestSeries {
        let report = self.acquire(self.config.lookback_days).await;
        let origin = report.origin;
        let mut series = report.series;
        let today = self.clock.today();

        let mut appended = None;
        let needs_today = series.last().is_some_and(|bar| bar.date != today);
        if needs_today {
            match self.resolver.resolve(series.last()).await {
                Some(quote) if quote.price > 0.0 => {
                    let bar = today_bar(today, &quote);
                    match bar.and_then(|bar| series.push(bar)) {
                        Ok(()) => {
                            info!(price = quote.price, "appended same-day bar");
                            appended = Some(quote);
                        }
                        Err(error) => warn!(%error, "could not append same-day bar"),
                    }
                }
                _ => debug!("no spot quote, series left without a same-day bar"),
            }
        }

        LatestSeries {
            origin,
            returns: returns::compute(&series),
            series,
            appended,
        }
    }

    async fn check_cache(
        &self,
        key: &SeriesKey,
        lookback_days: u32,
        mode: CacheMode,
    ) -> (CacheCheck, Option<(CanonicalSeries, QualityReport)>) {
        if !mode.reads() {
            return (CacheCheck::Skipped, None);
        }

        let snapshot = match self.cache.load(key).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return (CacheCheck::Miss, None),
            Err(error) => {
                warn!(series_key = %key, %error, "cache read failed, treating as miss");
                return (
                    CacheCheck::Error {
                        message: error.to_string(),
                    },
                    None,
                );
            }
        };

        let written_at = snapshot.written_at;
        if is_stale(&snapshot, self.config.cache_ttl, self.clock.now()) {
            debug!(series_key = %key, %written_at, "cached snapshot is stale");
            return (CacheCheck::Stale { written_at }, None);
        }

        let series = snapshot.series.keep_last(lookback_days as usize);
        let report = self.scorer.score(&series);
        if !report.valid {
            warn!(series_key = %key, score = report.score, "cached snapshot failed quality check");
            return (CacheCheck::Invalid { written_at, report }, None);
        }

        (CacheCheck::Hit { written_at }, Some((series, report)))
    }

    async fn scan_sources(&self, lookback_days: u32) -> (Option<Candidate>, Vec<AttemptRecord>) {
        let mut best: Option<Candidate> = None;
        let mut attempts = Vec::new();

        for adapter in &self.adapters {
            let descriptor = adapter.descriptor();
            if !descriptor.capabilities.supports(Endpoint::Series) {
                continue;
            }
            let provider = descriptor.provider;
            debug!(%provider, priority = descriptor.priority, "requesting series");

            let fetched =
                tokio::time::timeout(self.config.adapter_timeout, adapter.fetch_series(lookback_days))
                    .await;

            let series = match fetched {
                Err(_) => {
                    warn!(%provider, timeout_ms = self.config.adapter_timeout.as_millis() as u64, "series request timed out");
                    attempts.push(AttemptRecord {
                        provider,
                        outcome: AttemptOutcome::TimedOut,
                    });
                    continue;
                }
                Ok(Err(error)) => {
                    warn!(%provider, code = error.code(), %error, "series request failed");
                    attempts.push(AttemptRecord {
                        provider,
                        outcome: AttemptOutcome::Failed {
                            code: error.code().to_owned(),
                            message: error.message().to_owned(),
                        },
                    });
                    continue;
                }
                Ok(Ok(series)) if series.is_empty() => {
                    debug!(%provider, "provider returned no bars");
                    attempts.push(AttemptRecord {
                        provider,
                        outcome: AttemptOutcome::Empty,
                    });
                    continue;
                }
                Ok(Ok(series)) => series,
            };

            let report = self.scorer.score(&series);
            let score = report.score;
            let outcome = if report.valid {
                debug!(%provider, score, bars = series.len(), "candidate passed quality check");
                AttemptOutcome::Accepted {
                    report: report.clone(),
                }
            } else {
                warn!(%provider, score, issues = ?report.issue_messages(), "candidate failed quality check");
                AttemptOutcome::Rejected {
                    report: report.clone(),
                }
            };
            attempts.push(AttemptRecord { provider, outcome });

            if best.as_ref().map_or(true, |current| score > current.report.score) {
                best = Some(Candidate {
                    provider,
                    series,
                    report,
                });
            }

            if score >= self.config.early_exit_score {
                debug!(%provider, score, "early exit, candidate is good enough");
                break;
            }
        }

        (best, attempts)
    }

    async fn get_or_create_lock(&self, key: &SeriesKey) -> Arc<Mutex<()>> {
        let locks = self.key_locks.read().await;
        if let Some(lock) = locks.get(key) {
            return Arc::clone(lock);
        }
        drop(locks);

        let mut locks = self.key_locks.write().await;
        Arc::clone(
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

/// Today's bar from a live quote: flat open/close at the quote price, range
/// widened to include it.
fn today_bar(
    today: time::Date,
    quote: &SpotQuote,
) -> Result<CanonicalBar, crate::ValidationError> {
    CanonicalBar::new(
        today,
        quote.price,
        quote.day_high.max(quote.price),
        quote.day_low.min(quote.price),
        quote.price,
        quote.volume,
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::clock::FixedClock;
    use crate::testing::ScriptedAdapter;
    use crate::ColumnSet;
    use time::macros::date;
    use time::Duration as CalendarDuration;

    fn clean_series(len: usize, close: f64) -> CanonicalSeries {
        let start = date!(2024 - 01 - 01);
        let bars = (0..len)
            .map(|day| {
                let price = close + day as f64;
                CanonicalBar::new(
                    start + CalendarDuration::days(day as i64),
                    price - 1.0,
                    price + 2.0,
                    price - 3.0,
                    price,
                    1_000,
                )
                .expect("bar")
            })
            .collect();
        CanonicalSeries::from_bars(ColumnSet::full(), bars)
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            UtcDateTime::parse("2024-03-01T08:00:00Z").expect("timestamp"),
        ))
    }

    #[test]
    fn adapters_are_tried_in_priority_order() {
        let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
            .with_adapter(Arc::new(ScriptedAdapter::new(ProviderId::Yahoo, 5)))
            .with_adapter(Arc::new(ScriptedAdapter::new(ProviderId::Kitco, 2)))
            .with_cache_store(Arc::new(MemoryCacheStore::new()))
            .build();

        let order: Vec<_> = orchestrator
            .descriptors()
            .into_iter()
            .map(|descriptor| descriptor.provider)
            .collect();
        assert_eq!(order, vec![ProviderId::Kitco, ProviderId::Yahoo]);
    }

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(AcquisitionState::CacheCheck.to_string(), "cache_check");
        assert_eq!(AcquisitionState::SourceScan.to_string(), "source_scan");
    }

    #[tokio::test]
    async fn refresh_skips_fresh_snapshot_but_stores_result() {
        let clock = clock();
        let cache = Arc::new(MemoryCacheStore::new());
        let key = AcquisitionConfig::default().series_key;
        cache
            .save_at(&key, &clean_series(30, 1_000.0), clock.now())
            .await
            .expect("seed");
        let adapter = Arc::new(ScriptedAdapter::new(ProviderId::Kitco, 2).with_series(clean_series(30, 2_000.0)));

        let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
            .with_adapter(adapter.clone())
            .with_cache_store(cache.clone())
            .with_clock(clock)
            .build();

        let report = orchestrator.acquire_with(30, CacheMode::Refresh).await;

        assert_eq!(report.cache, CacheCheck::Skipped);
        assert_eq!(
            report.origin,
            SeriesOrigin::Provider {
                provider: ProviderId::Kitco
            }
        );
        assert_eq!(adapter.series_calls(), 1);
        let stored = cache.load(&key).await.expect("load").expect("snapshot");
        assert_eq!(stored.series.first().and_then(|bar| bar.close), Some(2_000.0));
    }

    #[tokio::test]
    async fn bypass_leaves_store_untouched() {
        let cache = Arc::new(MemoryCacheStore::new());
        let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
            .with_adapter(Arc::new(
                ScriptedAdapter::new(ProviderId::Kitco, 2).with_series(clean_series(30, 2_000.0)),
            ))
            .with_cache_store(cache.clone())
            .with_clock(clock())
            .build();

        let report = orchestrator.acquire_with(30, CacheMode::Bypass).await;

        assert_eq!(report.series.len(), 30);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_snapshot_falls_through_to_providers() {
        let clock = clock();
        let cache = Arc::new(MemoryCacheStore::new());
        let key = AcquisitionConfig::default().series_key;
        let broken = CanonicalSeries::from_bars(
            ColumnSet::full(),
            vec![CanonicalBar::new(date!(2024 - 02 - 29), 1.0, 0.5, 2.0, -1.0, 0).expect("bar")],
        );
        cache.save_at(&key, &broken, clock.now()).await.expect("seed");

        let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
            .with_adapter(Arc::new(
                ScriptedAdapter::new(ProviderId::Yahoo, 5).with_series(clean_series(30, 2_000.0)),
            ))
            .with_cache_store(cache)
            .with_clock(clock)
            .build();

        let report = orchestrator.acquire(30).await;

        assert!(matches!(report.cache, CacheCheck::Invalid { .. }));
        assert_eq!(report.series.len(), 30);
        assert_eq!(report.quality.map(|quality| quality.score), Some(100));
    }

    #[tokio::test]
    async fn latest_series_without_any_bar_appends_nothing() {
        let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
            .with_cache_store(Arc::new(MemoryCacheStore::new()))
            .with_clock(clock())
            .build();

        let latest = orchestrator.latest_series().await;

        assert_eq!(latest.origin, SeriesOrigin::Exhausted);
        assert!(latest.appended.is_none());
        assert!(latest.series.is_empty());
        assert!(latest.returns.is_empty());
    }
}
