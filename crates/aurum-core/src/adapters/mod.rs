//! Provider adapters.
//!
//! | Adapter | Priority | Series | Spot |
//! |---------|----------|--------|------|
//! | [`SinaAdapter`] | 1 | - | yes |
//! | [`KitcoAdapter`] | 2 | yes | - |
//! | [`AlphaVantageAdapter`] | 3 | yes | yes |
//! | [`FinnhubAdapter`] | 4 | yes | yes |
//! | [`YahooAdapter`] | 5 | yes | yes |

mod alphavantage;
mod finnhub;
mod kitco;
mod sina;
mod yahoo;

use std::sync::Arc;

pub use alphavantage::AlphaVantageAdapter;
pub use finnhub::FinnhubAdapter;
pub use kitco::KitcoAdapter;
pub use sina::SinaAdapter;
pub use yahoo::YahooAdapter;

use crate::clock::Clock;
use crate::config::ProviderCredentials;
use crate::data_source::{SourceAdapter, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RateBudget;
use crate::ProviderId;

/// Every built-in adapter, ascending by priority.
pub fn default_adapters(
    http_client: Arc<dyn HttpClient>,
    credentials: &ProviderCredentials,
    clock: Arc<dyn Clock>,
) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(SinaAdapter::new(Arc::clone(&http_client), Arc::clone(&clock))),
        Arc::new(KitcoAdapter::new(Arc::clone(&http_client))),
        Arc::new(AlphaVantageAdapter::new(
            Arc::clone(&http_client),
            credentials.alphavantage_api_key.clone(),
            Arc::clone(&clock),
        )),
        Arc::new(FinnhubAdapter::new(
            Arc::clone(&http_client),
            credentials.finnhub_api_key.clone(),
            Arc::clone(&clock),
        )),
        Arc::new(YahooAdapter::new(http_client, clock)),
    ]
}

/// Spends one unit of request budget, performs the call and returns the
/// body of a 2xx response.
async fn fetch_body(
    http_client: &dyn HttpClient,
    budget: &RateBudget,
    provider: ProviderId,
    request: HttpRequest,
) -> Result<String, SourceError> {
    budget.acquire_or_reject(provider.as_str())?;

    let response = http_client.execute(request).await.map_err(|error| {
        if error.timed_out() {
            SourceError::unavailable(format!("{provider} request timed out: {}", error.message()))
        } else {
            SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
        }
    })?;

    if !response.is_success() {
        return Err(SourceError::unavailable(format!(
            "{provider} returned status {}",
            response.status
        )));
    }

    Ok(response.body)
}

/// Lenient decimal parse used for the string-typed fields some providers send.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Volume cells arrive as floats or integers; negatives and NaN become zero.
fn volume_from(raw: Option<f64>) -> u64 {
    raw.filter(|value| value.is_finite() && *value > 0.0)
        .map(|value| value.round() as u64)
        .unwrap_or(0)
}
