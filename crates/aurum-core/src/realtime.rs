use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::data_source::{Endpoint, SourceAdapter};
use crate::{CanonicalBar, ProviderId, SpotQuote};

/// Spot price fallback chain.
///
/// Spot-capable adapters are asked in priority order and the first quote
/// with a positive price wins; quotes are not scored. When every adapter
/// fails, [`RealtimeResolver::resolve`] derives a quote from the newest
/// known bar and marks it as derived.
#[derive(Clone)]
pub struct RealtimeResolver {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl RealtimeResolver {
    pub fn new(adapters: &[Arc<dyn SourceAdapter>], timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut adapters: Vec<_> = adapters
            .iter()
            .filter(|adapter| adapter.descriptor().capabilities.supports(Endpoint::Spot))
            .cloned()
            .collect();
        adapters.sort_by_key(|adapter| adapter.descriptor().priority);

        Self {
            adapters,
            timeout,
            clock,
        }
    }

    /// Spot-capable providers in the order they are asked.
    pub fn providers(&self) -> Vec<ProviderId> {
        self.adapters
            .iter()
            .map(|adapter| adapter.descriptor().provider)
            .collect()
    }

    /// First live quote with a positive price, if any provider has one.
    pub async fn resolve_live(&self) -> Option<SpotQuote> {
        for adapter in &self.adapters {
            let provider = adapter.descriptor().provider;
            debug!(%provider, "requesting spot quote");

            match tokio::time::timeout(self.timeout, adapter.fetch_spot()).await {
                Ok(Ok(quote)) if quote.price > 0.0 => {
                    info!(%provider, price = quote.price, "spot quote resolved");
                    return Some(quote);
                }
                Ok(Ok(quote)) => {
                    warn!(%provider, price = quote.price, "ignoring non-positive spot quote");
                }
                Ok(Err(error)) => {
                    warn!(%provider, code = error.code(), %error, "spot quote failed");
                }
                Err(_) => {
                    warn!(%provider, timeout_ms = self.timeout.as_millis() as u64, "spot quote timed out");
                }
            }
        }
        None
    }

    /// Live quote, or one derived from `fallback` when no provider answers.
    pub async fn resolve(&self, fallback: Option<&CanonicalBar>) -> Option<SpotQuote> {
        if let Some(quote) = self.resolve_live().await {
            return Some(quote);
        }
        self.derive(fallback)
    }

    /// Quote derived from `fallback` without asking any provider.
    ///
    /// For callers that already walked the chain with [`Self::resolve_live`].
    pub fn derive(&self, fallback: Option<&CanonicalBar>) -> Option<SpotQuote> {
        let derived = fallback.and_then(|bar| SpotQuote::derived_from(bar, self.clock.now()));
        match &derived {
            Some(quote) => warn!(price = quote.price, "no live spot quote, using newest bar"),
            None => warn!("no live spot quote and no bar to derive one from"),
        }
        derived
    }
}
