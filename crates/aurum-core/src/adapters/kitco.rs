use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::fetch_body;
use crate::data_source::{AdapterDescriptor, CapabilitySet, SourceAdapter, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::RateBudget;
use crate::{CanonicalBar, CanonicalSeries, ColumnSet, ProviderId, UtcDateTime};

const GRAPH_URL: &str = "https://www.kitco.com/graph/kitco-gold.json";

/// Kitco gold price graph feed. Series only; volume is reported as 0.
#[derive(Clone)]
pub struct KitcoAdapter {
    http_client: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
    budget: RateBudget,
}

impl KitcoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let policy = ProviderPolicy::kitco_default();
        Self {
            http_client,
            budget: RateBudget::from_policy(&policy),
            policy,
        }
    }

    async fn fetch_graph(&self, lookback_days: u32) -> Result<CanonicalSeries, SourceError> {
        let request = HttpRequest::get(GRAPH_URL).with_timeout(self.policy.request_timeout);
        let body = fetch_body(&*self.http_client, &self.budget, ProviderId::Kitco, request).await?;

        let series = parse_graph(&body)?.keep_last(lookback_days as usize);
        debug!(bars = series.len(), "kitco graph parsed");
        Ok(series)
    }
}

impl SourceAdapter for KitcoAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor::new(ProviderId::Kitco, 2, CapabilitySet::series_only())
    }

    fn fetch_series(&self, lookback_days: u32) -> SourceFuture<'_, CanonicalSeries> {
        Box::pin(self.fetch_graph(lookback_days))
    }
}

#[derive(Debug, Deserialize)]
struct KitcoGraph {
    gold: Option<KitcoGold>,
}

#[derive(Debug, Deserialize)]
struct KitcoGold {
    #[serde(default)]
    prices: Vec<Vec<Option<f64>>>,
}

/// Rows are `[timestamp_ms, open, high, low, close]`; shorter rows and rows
/// without a timestamp are dropped.
fn parse_graph(body: &str) -> Result<CanonicalSeries, SourceError> {
    let graph: KitcoGraph = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse kitco graph: {e}")))?;
    let gold = graph
        .gold
        .ok_or_else(|| SourceError::malformed("kitco graph has no gold section"))?;

    let bars = gold
        .prices
        .iter()
        .filter(|row| row.len() >= 5)
        .filter_map(|row| {
            let millis = row[0].filter(|value| value.is_finite())? as i64;
            let date = UtcDateTime::from_unix_millis(millis)?.date();
            Some(CanonicalBar::from_lossy(
                date, row[1], row[2], row[3], row[4], 0,
            ))
        })
        .collect();

    Ok(CanonicalSeries::from_bars(ColumnSet::full(), bars))
}
