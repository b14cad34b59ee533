use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{fetch_body, volume_from};
use crate::clock::Clock;
use crate::data_source::{AdapterDescriptor, CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{CanonicalBar, CanonicalSeries, ColumnSet, ProviderId, SpotQuote, UtcDateTime};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
/// COMEX gold front-month future.
const SYMBOL: &str = "GC=F";

/// Yahoo Finance v8 chart API. The chart `meta` block doubles as the spot quote.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        let policy = ProviderPolicy::yahoo_default();
        Self {
            http_client,
            clock,
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    async fn fetch_chart(&self, range_days: u32) -> Result<YahooChartResult, SourceError> {
        let url = format!(
            "{CHART_URL}/{}?range={}d&interval=1d",
            urlencoding::encode(SYMBOL),
            range_days.max(1)
        );
        let request = HttpRequest::get(url).with_timeout(self.policy.request_timeout);

        let body = fetch_body(&*self.http_client, &self.budget, ProviderId::Yahoo, request).await?;
        parse_chart(&body)
    }

    async fn fetch_daily(&self, lookback_days: u32) -> Result<CanonicalSeries, SourceError> {
        let chart = self.fetch_chart(lookback_days).await?;
        let series = chart_series(&chart).keep_last(lookback_days as usize);
        debug!(bars = series.len(), "yahoo chart parsed");
        Ok(series)
    }

    async fn fetch_quote(&self) -> Result<SpotQuote, SourceError> {
        let chart = self.fetch_chart(1).await?;
        chart_quote(&chart, self.clock.now())
    }
}

impl SourceAdapter for YahooAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(ProviderId::Yahoo, 5, CapabilitySet::full())
    }

    fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        Box::pin(self.fetch_daily(lookback_days))
    }

    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        Box::pin(self.fetch_quote())
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    result: Option<Vec<YahooChartResult>>,
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<YahooChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_time: Option<i64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart(body: &str) -> Result<YahooChartResult, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error {}: {}",
            error.code.as_deref().unwrap_or("unknown"),
            error.description.as_deref().unwrap_or("no description")
        )));
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::malformed("yahoo chart has no result"))
}

/// Rows whose OHLC cells are all null (holidays, the still-open session on
/// some feeds) carry no information and are dropped; partially null rows are kept.
fn chart_series(chart: &YahooChartResult) -> CanonicalSeries {
    let Some(quote) = chart
        .indicators
        .as_ref()
        .and_then(|indicators| indicators.quote.first())
    else {
        return CanonicalSeries::empty();
    };

    fn cell(column: &[Option<f64>], index: usize) -> Option<f64> {
        column.get(index).copied().flatten()
    }

    let bars = chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(index, seconds)| {
            let date = UtcDateTime::from_unix_seconds(*seconds)?.date();
            let bar = CanonicalBar::from_lossy(
                date,
                cell(&quote.open, index),
                cell(&quote.high, index),
                cell(&quote.low, index),
                cell(&quote.close, index),
                volume_from(cell(&quote.volume, index)),
            );
            let all_null = bar.open.is_none()
                && bar.high.is_none()
                && bar.low.is_none()
                && bar.close.is_none();
            (!all_null).then_some(bar)
        })
        .collect();

    CanonicalSeries::from_bars(ColumnSet::full(), bars)
}

fn chart_quote(chart: &YahooChartResult, now: UtcDateTime) -> Result<SpotQuote, SourceError> {
    let meta = &chart.meta;
    let price = meta
        .regular_market_price
        .ok_or_else(|| SourceError::malformed("yahoo chart meta has no market price"))?;
    let change_percent = meta
        .chart_previous_close
        .or(meta.previous_close)
        .filter(|prev| *prev > 0.0)
        .map(|prev| (price - prev) / prev * 100.0);
    let observed_at = meta
        .regular_market_time
        .and_then(UtcDateTime::from_unix_seconds)
        .unwrap_or(now);

    SpotQuote::live(
        ProviderId::Yahoo,
        price,
        meta.regular_market_day_high,
        meta.regular_market_day_low,
        change_percent,
        volume_from(meta.regular_market_volume),
        observed_at,
    )
    .map_err(|e| SourceError::malformed(format!("yahoo quote rejected: {e}")))
}
