use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{fetch_body, parse_decimal, volume_from};
use crate::clock::Clock;
use crate::data_source::{AdapterDescriptor, CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{
    parse_iso_date, CanonicalBar, CanonicalSeries, ColumnSet, ProviderId, SpotQuote, UtcDateTime,
};

const QUERY_URL: &str = "https://www.alphavantage.co/query";
const SYMBOL: &str = "XAUUSD";
/// Size of the `compact` output; longer lookbacks need `full`.
const COMPACT_ROWS: u32 = 100;

/// Alpha Vantage daily series and global quote for XAUUSD.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    clock: Arc<dyn Clock>,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl AlphaVantageAdapter {
    /// Without a key the public `demo` key is used.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = ProviderPolicy::alphavantage_default();
        Self {
            http_client,
            api_key: api_key.unwrap_or_else(|| String::from("demo")),
            clock,
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    fn endpoint(&self, function: &str, extra: &str) -> String {
        format!(
            "{QUERY_URL}?function={function}&symbol={SYMBOL}{extra}&apikey={}",
            urlencoding::encode(&self.api_key)
        )
    }

    async fn fetch_daily(&self, lookback_days: u32) -> Result<CanonicalSeries, SourceError> {
        let output_size = if lookback_days > COMPACT_ROWS {
            "full"
        } else {
            "compact"
        };
        let request = HttpRequest::get(
            self.endpoint("TIME_SERIES_DAILY", &format!("&outputsize={output_size}")),
        )
        .with_timeout(self.policy.request_timeout);

        let body =
            fetch_body(&*self.http_client, &self.budget, ProviderId::Alphavantage, request).await?;
        let series = parse_daily(&body)?.keep_last(lookback_days as usize);
        debug!(bars = series.len(), "alphavantage daily series parsed");
        Ok(series)
    }

    async fn fetch_global_quote(&self) -> Result<SpotQuote, SourceError> {
        let request = HttpRequest::get(self.endpoint("GLOBAL_QUOTE", ""))
            .with_timeout(self.policy.request_timeout);

        let body =
            fetch_body(&*self.http_client, &self.budget, ProviderId::Alphavantage, request).await?;
        parse_global_quote(&body, self.clock.now())
    }
}

impl SourceAdapter for AlphaVantageAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(ProviderId::Alphavantage, 3, CapabilitySet::full())
    }

    fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        Box::pin(self.fetch_daily(lookback_days))
    }

    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        Box::pin(self.fetch_global_quote())
    }
}

/// Fields shared by every Alpha Vantage response that signal a refusal.
#[derive(Debug, Default, Deserialize)]
struct Notices {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

impl Notices {
    fn into_error(self) -> Option<SourceError> {
        if let Some(message) = self.note.or(self.information) {
            return Some(SourceError::rate_limited(format!("alphavantage: {message}")));
        }
        self.error_message
            .map(|message| SourceError::unavailable(format!("alphavantage: {message}")))
    }
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyRow>>,
    #[serde(flatten)]
    notices: Notices,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    #[serde(rename = "1. open")]
    open: Option<String>,
    #[serde(rename = "2. high")]
    high: Option<String>,
    #[serde(rename = "3. low")]
    low: Option<String>,
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
    #[serde(flatten)]
    notices: Notices,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

fn decimal(raw: &Option<String>) -> Option<f64> {
    raw.as_deref().and_then(parse_decimal)
}

fn parse_daily(body: &str) -> Result<CanonicalSeries, SourceError> {
    let response: DailyResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse alphavantage series: {e}")))?;

    let Some(time_series) = response.time_series else {
        return Err(response
            .notices
            .into_error()
            .unwrap_or_else(|| SourceError::malformed("alphavantage response has no daily series")));
    };

    let has_volume = time_series.values().any(|row| row.volume.is_some());
    let bars = time_series
        .iter()
        .filter_map(|(date, row)| {
            let date = parse_iso_date(date).ok()?;
            Some(CanonicalBar::from_lossy(
                date,
                decimal(&row.open),
                decimal(&row.high),
                decimal(&row.low),
                decimal(&row.close),
                volume_from(decimal(&row.volume)),
            ))
        })
        .collect();

    let columns = if has_volume {
        ColumnSet::full()
    } else {
        ColumnSet::without_volume()
    };
    Ok(CanonicalSeries::from_bars(columns, bars))
}

fn parse_global_quote(body: &str, observed_at: UtcDateTime) -> Result<SpotQuote, SourceError> {
    let response: QuoteResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse alphavantage quote: {e}")))?;

    let Some(quote) = response.quote else {
        return Err(response
            .notices
            .into_error()
            .unwrap_or_else(|| SourceError::malformed("alphavantage response has no global quote")));
    };

    let price = decimal(&quote.price)
        .ok_or_else(|| SourceError::malformed("alphavantage global quote has no price"))?;

    SpotQuote::live(
        ProviderId::Alphavantage,
        price,
        decimal(&quote.high),
        decimal(&quote.low),
        decimal(&quote.change_percent),
        volume_from(decimal(&quote.volume)),
        observed_at,
    )
    .map_err(|e| SourceError::malformed(format!("alphavantage quote rejected: {e}")))
}
