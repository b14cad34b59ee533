use std::sync::Arc;

use tracing::debug;

use super::{fetch_body, parse_decimal};
use crate::clock::Clock;
use crate::data_source::{
    AdapterDescriptor, CapabilitySet, Endpoint, SourceAdapter, SourceError, SourceFuture,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{CanonicalSeries, ProviderId, SpotQuote, UtcDateTime};

const QUOTE_URL: &str = "http://hq.sinajs.cn/list=hf_XAU";
const REFERER: &str = "https://finance.sina.com.cn/";

/// Sina Finance London gold quote line. Spot only.
#[derive(Clone)]
pub struct SinaAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl SinaAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        let policy = ProviderPolicy::sina_default();
        Self {
            http_client,
            clock,
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    async fn fetch_quote(&self) -> Result<SpotQuote, SourceError> {
        let request = HttpRequest::get(QUOTE_URL)
            .with_header("Referer", REFERER)
            .with_timeout(self.policy.request_timeout);

        let body = fetch_body(&*self.http_client, &self.budget, ProviderId::Sina, request).await?;
        let quote = parse_quote_line(&body, self.clock.now())?;
        debug!(price = quote.price, "sina quote parsed");
        Ok(quote)
    }
}

impl SourceAdapter for SinaAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(ProviderId::Sina, 1, CapabilitySet::spot_only())
    }

    fn fetch_series(&self, _lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        Box::pin(async { Err(SourceError::unsupported_endpoint(Endpoint::Series)) })
    }

    fn fetch_spot(&self) -> SourceFuture<'_, SpotQuote> {
        Box::pin(self.fetch_quote())
    }
}

/// Parses `var hq_str_hf_XAU="price,,bid,ask,high,low,time,prev_close,open,...";`.
fn parse_quote_line(body: &str, observed_at: UtcDateTime) -> Result<SpotQuote, SourceError> {
    let content = body
        .split('"')
        .nth(1)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| SourceError::malformed("sina quote line has no payload"))?;

    let fields: Vec<&str> = content.split(',').collect();
    let field = |index: usize| fields.get(index).copied().and_then(parse_decimal);

    let price = field(0)
        .ok_or_else(|| SourceError::malformed("sina quote line has no price field"))?;
    let previous_close = field(7).filter(|value| *value > 0.0);
    let change_percent = previous_close.map(|prev| (price - prev) / prev * 100.0);

    SpotQuote::live(
        ProviderId::Sina,
        price,
        field(4),
        field(5),
        change_percent,
        0,
        observed_at,
    )
    .map_err(|e| SourceError::malformed(format!("sina quote rejected: {e}")))
}
