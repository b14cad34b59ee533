use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{fetch_body, volume_from};
use crate::clock::Clock;
use crate::data_source::{AdapterDescriptor, CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{CanonicalBar, CanonicalSeries, ColumnSet, ProviderId, SpotQuote, UtcDateTime};

const API_BASE: &str = "https://finnhub.io/api/v1";
const SYMBOL: &str = "OANDA:XAUUSD";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Finnhub forex candles and quote for OANDA:XAUUSD. Requires an API token.
#[derive(Clone)]
pub struct FinnhubAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    clock: Arc<dyn Clock>,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl FinnhubAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = ProviderPolicy::finnhub_default();
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            clock,
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    fn token(&self) -> Result<&str, SourceError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SourceError::not_configured("finnhub requires an API token"))
    }

    async fn fetch_candles(&self, lookback_days: u32) -> Result<CanonicalSeries, SourceError> {
        let token = self.token()?;
        let now = self.clock.now();
        let from = now
            .checked_sub(Duration::from_secs(u64::from(lookback_days) * SECONDS_PER_DAY))
            .unwrap_or(now);

        let url = format!(
            "{API_BASE}/forex/candle?symbol={}&resolution=D&from={}&to={}&token={}",
            urlencoding::encode(SYMBOL),
            from.unix_seconds(),
            now.unix_seconds(),
            urlencoding::encode(token)
        );
        let request = HttpRequest::get(url).with_timeout(self.policy.request_timeout);

        let body = fetch_body(&*self.http_client, &self.budget, ProviderId::Finnhub, request).await?;
        let series = parse_candles(&body)?.keep_last(lookback_days as usize);
        debug!(bars = series.len(), "finnhub candles parsed");
        Ok(series)
    }

    async fn fetch_quote(&self) -> Result<SpotQuote, SourceError> {
        let token = self.token()?;
        let url = format!(
            "{API_BASE}/quote?symbol={}&token={}",
            urlencoding::encode(SYMBOL),
            urlencoding::encode(token)
        );
        let request = HttpRequest::get(url).with_timeout(self.policy.request_timeout);

        let body = fetch_body(&*self.http_client, &self.budget, ProviderId::Finnhub, request).await?;
        parse_quote(&body, self.clock.now())
    }
}

impl SourceAdapter for FinnhubAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(ProviderId::Finnhub, 4, CapabilitySet::full())
    }

    fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        Box::pin(self.fetch_candles(lookback_days))
    }

    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        Box::pin(self.fetch_quote())
    }
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<Option<f64>>,
    #[serde(default)]
    h: Vec<Option<f64>>,
    #[serde(default)]
    l: Vec<Option<f64>>,
    #[serde(default)]
    c: Vec<Option<f64>>,
    #[serde(default)]
    v: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    c: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    pc: Option<f64>,
    t: Option<i64>,
}

/// Column-oriented candles; `s == "no_data"` is an empty answer, not a failure.
fn parse_candles(body: &str) -> Result<CanonicalSeries, SourceError> {
    let response: CandleResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse finnhub candles: {e}")))?;

    match response.s.as_str() {
        "ok" => {}
        "no_data" => return Ok(CanonicalSeries::empty()),
        other => {
            return Err(SourceError::unavailable(format!(
                "finnhub candle status '{other}'"
            )))
        }
    }

    fn cell(column: &[Option<f64>], index: usize) -> Option<f64> {
        column.get(index).copied().flatten()
    }

    let bars = response
        .t
        .iter()
        .enumerate()
        .filter_map(|(index, seconds)| {
            let date = UtcDateTime::from_unix_seconds(*seconds)?.date();
            Some(CanonicalBar::from_lossy(
                date,
                cell(&response.o, index),
                cell(&response.h, index),
                cell(&response.l, index),
                cell(&response.c, index),
                volume_from(cell(&response.v, index)),
            ))
        })
        .collect();

    Ok(CanonicalSeries::from_bars(ColumnSet::full(), bars))
}

fn parse_quote(body: &str, now: UtcDateTime) -> Result<SpotQuote, SourceError> {
    let response: QuoteResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse finnhub quote: {e}")))?;

    let price = response
        .c
        .ok_or_else(|| SourceError::malformed("finnhub quote has no current price"))?;
    let change_percent = response
        .pc
        .filter(|prev| *prev > 0.0)
        .map(|prev| (price - prev) / prev * 100.0);
    let observed_at = response
        .t
        .filter(|seconds| *seconds > 0)
        .and_then(UtcDateTime::from_unix_seconds)
        .unwrap_or(now);

    SpotQuote::live(
        ProviderId::Finnhub,
        price,
        response.h,
        response.l,
        change_percent,
        0,
        observed_at,
    )
    .map_err(|e| SourceError::malformed(format!("finnhub quote rejected: {e}")))
}
