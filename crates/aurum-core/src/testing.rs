//! Scripted adapter for deterministic orchestrator and resolver tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::data_source::{
    AdapterDescriptor, CapabilitySet, Endpoint, SourceAdapter, SourceError, SourceFuture,
};
use crate::{CanonicalSeries, ProviderId, SpotQuote};

/// Canned answer of one scripted endpoint.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Data(T),
    Fail(SourceError),
    /// Never completes; exercises caller timeouts.
    Hang,
}

/// Adapter that replays canned answers and counts how often it was asked.
///
/// An endpoint left unscripted is reported as unsupported by the descriptor.
#[derive(Debug)]
pub struct ScriptedAdapter {
    provider: ProviderId,
    priority: u8,
    series: Option<Scripted<CanonicalSeries>>,
    spot: Option<Scripted<SpotQuote>>,
    delay: Duration,
    series_calls: AtomicUsize,
    spot_calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(provider: ProviderId, priority: u8) -> Self {
        Self {
            provider,
            priority,
            series: None,
            spot: None,
            delay: Duration::ZERO,
            series_calls: AtomicUsize::new(0),
            spot_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_series(mut self, series: CanonicalSeries) -> Self {
        self.series = Some(Scripted::Data(series));
        self
    }

    pub fn with_series_script(mut self, script: Scripted<CanonicalSeries>) -> Self {
        self.series = Some(script);
        self
    }

    pub fn with_spot(mut self, quote: SpotQuote) -> Self {
        self.spot = Some(Scripted::Data(quote));
        self
    }

    pub fn with_spot_script(mut self, script: Scripted<SpotQuote>) -> Self {
        self.spot = Some(script);
        self
    }

    /// Sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    pub fn spot_calls(&self) -> usize {
        self.spot_calls.load(Ordering::SeqCst)
    }

    async fn answer<T: Clone>(
        &self,
        script: Option<&Scripted<T>>,
        endpoint: Endpoint,
    ) -> Result<T, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match script {
            Some(Scripted::Data(value)) => Ok(value.clone()),
            Some(Scripted::Fail(error)) => Err(error.clone()),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(SourceError::unsupported_endpoint(endpoint)),
        }
    }
}

impl SourceAdapter for ScriptedAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(
            self.provider,
            self.priority,
            CapabilitySet::new(self.series.is_some(), self.spot.is_some()),
        )
    }

    fn fetch_series(&self, _lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(self.answer(self.series.as_ref(), Endpoint::Series))
    }

    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(self.answer(self.spot.as_ref(), Endpoint::Spot))
    }
}
