//! Contract tests for the built-in provider adapters
//!
//! Every adapter is driven through the offline HTTP transport with payloads
//! shaped like the real provider responses and must honor the same contract:
//! ascending date-unique series bounded by the lookback, live quotes tagged
//! with their provider, and failures reported as classified source errors.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;
use std::time::Duration;

use aurum_core::http_client::StubHttpClient;
use aurum_core::{
    default_adapters, AcquisitionConfig, AcquisitionOrchestrator, Endpoint, HttpError,
    HttpResponse, MemoryCacheStore, ProviderCredentials, ProviderId, SeriesOrigin, SourceAdapter,
};
use support::fixed_clock;

const SINA_LINE: &str = "var hq_str_hf_XAU=\"2345.60,,2345.50,2345.90,2360.10,2330.20,14:25:00,2320.00,2338.50,0,0,0,2024-05-01,London Gold\";\n";

const KITCO_GRAPH: &str = r#"{"gold":{"prices":[
    [1714521600000, 2300.0, 2312.0, 2295.0, 2305.0],
    [1714608000000, 2310.0, 2320.0, 2300.0, 2315.0],
    [1714694400000, 2315.0, 2322.0, 2310.0, 2318.0]
]}}"#;

const ALPHAVANTAGE_DAILY: &str = r#"{
    "Meta Data": {"2. Symbol": "XAUUSD"},
    "Time Series (Daily)": {
        "2024-05-02": {"1. open": "2310.0", "2. high": "2325.5", "3. low": "2301.0", "4. close": "2320.4", "5. volume": "1200"},
        "2024-05-01": {"1. open": "2300.0", "2. high": "2315.0", "3. low": "2290.0", "4. close": "2310.0", "5. volume": "900"},
        "2024-04-30": {"1. open": "2290.0", "2. high": "2302.0", "3. low": "2280.0", "4. close": "2300.0", "5. volume": "700"}
    }
}"#;

const ALPHAVANTAGE_QUOTE: &str = r#"{"Global Quote": {
    "01. symbol": "XAUUSD", "03. high": "2330.0", "04. low": "2300.0",
    "05. price": "2321.7", "06. volume": "0", "10. change percent": "0.5321%"
}}"#;

const FINNHUB_CANDLES: &str = r#"{"s":"ok",
    "t":[1714521600,1714608000,1714694400],
    "o":[2300.0,2310.0,2315.0],"h":[2312.0,2320.0,2322.0],"l":[2295.0,2300.0,2310.0],
    "c":[2305.0,2315.0,2318.0],"v":[80,120,95]}"#;

const FINNHUB_QUOTE: &str = r#"{"c":2420.0,"h":2425.0,"l":2390.0,"pc":2400.0,"t":1714656600}"#;

const YAHOO_CHART: &str = r#"{"chart":{"result":[{
    "meta":{"currency":"USD","symbol":"GC=F","regularMarketPrice":2330.5,
            "chartPreviousClose":2310.0,"regularMarketDayHigh":2335.0,
            "regularMarketDayLow":2301.2,"regularMarketVolume":150000,
            "regularMarketTime":1714656600},
    "timestamp":[1714536000,1714622400,1714708800],
    "indicators":{"quote":[{
        "open":[2300.0,2310.0,2318.0],
        "high":[2315.0,2335.0,2325.0],
        "low":[2290.0,2301.2,2312.0],
        "close":[2310.0,2330.5,2320.0],
        "volume":[120000,150000,90000]}]}}],"error":null}}"#;

fn healthy_transport() -> StubHttpClient {
    StubHttpClient::new()
        .route("hq.sinajs.cn", HttpResponse::ok(SINA_LINE))
        .route("kitco-gold.json", HttpResponse::ok(KITCO_GRAPH))
        .route("TIME_SERIES_DAILY", HttpResponse::ok(ALPHAVANTAGE_DAILY))
        .route("GLOBAL_QUOTE", HttpResponse::ok(ALPHAVANTAGE_QUOTE))
        .route("forex/candle", HttpResponse::ok(FINNHUB_CANDLES))
        .route("api/v1/quote", HttpResponse::ok(FINNHUB_QUOTE))
        .route("finance/chart", HttpResponse::ok(YAHOO_CHART))
}

fn credentials() -> ProviderCredentials {
    ProviderCredentials::default().with_finnhub_key("contract-token")
}

fn adapters_over(transport: StubHttpClient) -> Vec<Arc<dyn SourceAdapter>> {
    default_adapters(Arc::new(transport), &credentials(), fixed_clock())
}

fn offered(adapter: &dyn SourceAdapter) -> Vec<Endpoint> {
    let capabilities = adapter.descriptor().capabilities;
    [Endpoint::Series, Endpoint::Spot]
        .into_iter()
        .filter(|endpoint| capabilities.supports(*endpoint))
        .collect()
}

// =============================================================================
// Contract: successful responses
// =============================================================================

#[tokio::test]
async fn when_provider_answers_every_adapter_returns_bounded_ascending_series() {
    // Given: Every adapter over healthy provider payloads
    for adapter in adapters_over(healthy_transport()) {
        let descriptor = adapter.descriptor();
        if !descriptor.capabilities.supports(Endpoint::Series) {
            continue;
        }

        // When: A two-day series is requested
        let series = adapter
            .fetch_series(2)
            .await
            .unwrap_or_else(|e| panic!("{} series failed: {e}", descriptor.provider));

        // Then: It is non-empty, bounded and strictly ascending
        assert!(!series.is_empty(), "{} returned no bars", descriptor.provider);
        assert!(series.len() <= 2, "{} ignored the lookback", descriptor.provider);
        assert!(
            series.bars().windows(2).all(|pair| pair[0].date < pair[1].date),
            "{} bars are not ascending",
            descriptor.provider
        );
    }
}

#[tokio::test]
async fn when_provider_answers_every_adapter_returns_a_tagged_live_quote() {
    // Given: Every adapter over healthy provider payloads
    for adapter in adapters_over(healthy_transport()) {
        let descriptor = adapter.descriptor();
        if !descriptor.capabilities.supports(Endpoint::Spot) {
            continue;
        }

        // When: A spot quote is requested
        let quote = adapter
            .fetch_spot()
            .await
            .unwrap_or_else(|e| panic!("{} spot failed: {e}", descriptor.provider));

        // Then: It is live, attributed and internally consistent
        assert!(quote.is_live());
        assert_eq!(quote.provider(), Some(descriptor.provider));
        assert!(quote.price > 0.0);
        assert!(quote.day_low <= quote.price && quote.price <= quote.day_high);
    }
}

#[tokio::test]
async fn when_endpoint_is_not_offered_adapter_reports_unsupported() {
    // Given: Every adapter
    for adapter in adapters_over(healthy_transport()) {
        let descriptor = adapter.descriptor();

        // When/Then: Endpoints outside the capability set fail as unsupported
        if !descriptor.capabilities.supports(Endpoint::Series) {
            let err = adapter.fetch_series(30).await.expect_err("unsupported");
            assert_eq!(err.code(), "source.unsupported_endpoint");
        }
        if !descriptor.capabilities.supports(Endpoint::Spot) {
            let err = adapter.fetch_spot().await.expect_err("unsupported");
            assert_eq!(err.code(), "source.unsupported_endpoint");
        }
    }
}

// =============================================================================
// Contract: failures
// =============================================================================

#[tokio::test]
async fn when_provider_returns_error_status_every_adapter_reports_unavailable() {
    // Given: A transport answering 503 to everything
    let transport = StubHttpClient::new().route("", HttpResponse::with_status(503, "busy"));

    for adapter in adapters_over(transport) {
        let descriptor = adapter.descriptor();
        for endpoint in offered(&*adapter) {
            // When: The endpoint is called
            let result = match endpoint {
                Endpoint::Series => adapter.fetch_series(30).await.map(|_| ()),
                Endpoint::Spot => adapter.fetch_spot().await.map(|_| ()),
            };

            // Then: The failure is classified as unavailable
            let err = result.expect_err("503 must fail");
            assert_eq!(err.code(), "source.unavailable", "{} {endpoint}", descriptor.provider);
        }
    }
}

#[tokio::test]
async fn when_transport_times_out_every_adapter_reports_unavailable() {
    // Given: A transport whose every request times out
    let transport = StubHttpClient::new().route_error("", HttpError::timeout("deadline exceeded"));

    for adapter in adapters_over(transport) {
        let descriptor = adapter.descriptor();
        for endpoint in offered(&*adapter) {
            let result = match endpoint {
                Endpoint::Series => adapter.fetch_series(30).await.map(|_| ()),
                Endpoint::Spot => adapter.fetch_spot().await.map(|_| ()),
            };

            let err = result.expect_err("timeout must fail");
            assert_eq!(err.code(), "source.unavailable", "{} {endpoint}", descriptor.provider);
            assert!(err.retryable());
        }
    }
}

#[tokio::test]
async fn when_payload_is_garbage_every_adapter_reports_malformed() {
    // Given: A transport answering an HTML error page with status 200
    let transport = StubHttpClient::new().route("", HttpResponse::ok("<html>blocked</html>"));

    for adapter in adapters_over(transport) {
        let descriptor = adapter.descriptor();
        for endpoint in offered(&*adapter) {
            let result = match endpoint {
                Endpoint::Series => adapter.fetch_series(30).await.map(|_| ()),
                Endpoint::Spot => adapter.fetch_spot().await.map(|_| ()),
            };

            let err = result.expect_err("garbage must fail");
            assert_eq!(err.code(), "source.malformed", "{} {endpoint}", descriptor.provider);
        }
    }
}

#[tokio::test]
async fn when_finnhub_has_no_token_system_skips_it_without_network() {
    // Given: Default credentials, which carry no Finnhub token
    let transport = Arc::new(healthy_transport());
    let adapters = default_adapters(
        transport.clone(),
        &ProviderCredentials::default(),
        fixed_clock(),
    );
    let finnhub = adapters
        .iter()
        .find(|adapter| adapter.descriptor().provider == ProviderId::Finnhub)
        .expect("finnhub registered");

    // When: A series is requested
    let err = finnhub.fetch_series(30).await.expect_err("no token");

    // Then: It is reported as not configured and nothing was sent
    assert_eq!(err.code(), "source.not_configured");
    assert!(transport.requests().is_empty());
}

// =============================================================================
// Contract: end to end over the built-in adapters
// =============================================================================

#[tokio::test]
async fn when_first_series_provider_is_excellent_system_never_calls_the_rest() {
    // Given: A Kitco feed with twenty clean days and every other provider healthy
    let rows: Vec<String> = (0..20)
        .map(|day| {
            let millis = 1_714_521_600_000_i64 + day * 86_400_000;
            let close = 2_300.0 + day as f64;
            format!("[{millis}, {}, {}, {}, {close}]", close - 1.0, close + 2.0, close - 3.0)
        })
        .collect();
    let graph = format!(r#"{{"gold":{{"prices":[{}]}}}}"#, rows.join(","));
    let transport = Arc::new(
        StubHttpClient::new()
            .route("hq.sinajs.cn", HttpResponse::ok(SINA_LINE))
            .route("kitco-gold.json", HttpResponse::ok(graph)),
    );
    let clock = fixed_clock();
    let orchestrator = AcquisitionOrchestrator::builder(
        AcquisitionConfig::default().with_adapter_timeout(Duration::from_secs(1)),
    )
    .with_adapters(default_adapters(transport.clone(), &credentials(), clock.clone()))
    .with_cache_store(Arc::new(MemoryCacheStore::new()))
    .with_clock(clock)
    .build();

    // When: A series and a spot price are requested
    let report = orchestrator.acquire(365).await;
    let spot = orchestrator.get_spot().await.expect("spot");

    // Then: Kitco wins outright, Sina provides the spot price
    assert_eq!(
        report.origin,
        SeriesOrigin::Provider {
            provider: ProviderId::Kitco
        }
    );
    assert_eq!(report.series.len(), 20);
    assert_eq!(spot.provider(), Some(ProviderId::Sina));
    assert!(transport
        .requests()
        .iter()
        .all(|request| !request.url.contains("alphavantage")));
}
