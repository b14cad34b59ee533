//! Behavior-driven tests for spot price resolution
//!
//! These tests verify HOW the spot fallback chain walks providers and what it
//! reports when none of them answers.

mod support;

use std::sync::Arc;
use std::time::Duration;

use aurum_core::testing::{Scripted, ScriptedAdapter};
use aurum_core::{
    AcquisitionConfig, AcquisitionOrchestrator, MemoryCacheStore, ProviderId, QuoteProvenance,
    RealtimeResolver, SourceAdapter, SourceError,
};
use support::{bar, clean_series, day, fixed_clock, live_quote};

const TIMEOUT: Duration = Duration::from_millis(100);

#[tokio::test]
async fn when_first_provider_fails_system_uses_the_next_one() {
    // Given: A failing first provider and a healthy second one
    let failing = Arc::new(
        ScriptedAdapter::new(ProviderId::Sina, 1)
            .with_spot_script(Scripted::Fail(SourceError::unavailable("down"))),
    );
    let healthy = Arc::new(
        ScriptedAdapter::new(ProviderId::Yahoo, 5).with_spot(live_quote(ProviderId::Yahoo, 2_345.6)),
    );
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![healthy.clone(), failing.clone()];
    let resolver = RealtimeResolver::new(&adapters, TIMEOUT, fixed_clock());

    // When: A spot quote is resolved
    let quote = resolver.resolve(None).await.expect("quote");

    // Then: Providers were asked in priority order and the second answered
    assert_eq!(resolver.providers(), vec![ProviderId::Sina, ProviderId::Yahoo]);
    assert_eq!(quote.provider(), Some(ProviderId::Yahoo));
    assert_eq!(quote.price, 2_345.6);
    assert_eq!(failing.spot_calls(), 1);
}

#[tokio::test]
async fn when_quote_has_no_price_system_skips_it() {
    // Given: A provider reporting a zero price ahead of a real one
    let zero = Arc::new(
        ScriptedAdapter::new(ProviderId::Sina, 1).with_spot(live_quote(ProviderId::Sina, 0.0)),
    );
    let real = Arc::new(
        ScriptedAdapter::new(ProviderId::Finnhub, 4)
            .with_spot(live_quote(ProviderId::Finnhub, 2_401.0)),
    );
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![zero, real];
    let resolver = RealtimeResolver::new(&adapters, TIMEOUT, fixed_clock());

    // When: A live quote is resolved
    let quote = resolver.resolve_live().await.expect("quote");

    // Then: The zero quote is ignored
    assert_eq!(quote.provider(), Some(ProviderId::Finnhub));
}

#[tokio::test]
async fn when_every_provider_fails_system_derives_quote_from_newest_bar() {
    // Given: Providers that fail or hang, and a known newest bar
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(
            ScriptedAdapter::new(ProviderId::Sina, 1)
                .with_spot_script(Scripted::Fail(SourceError::rate_limited("budget spent"))),
        ),
        Arc::new(ScriptedAdapter::new(ProviderId::Yahoo, 5).with_spot_script(Scripted::Hang)),
    ];
    let resolver = RealtimeResolver::new(&adapters, TIMEOUT, fixed_clock());
    let newest = bar(day(30), 2_050.0);

    // When: A quote is resolved with the bar as fallback
    let quote = resolver.resolve(Some(&newest)).await.expect("derived quote");

    // Then: The quote mirrors the bar and is marked as derived
    assert!(!quote.is_live());
    assert_eq!(quote.price, 2_050.0);
    assert_eq!(quote.change_percent, 0.0);
    assert_eq!(
        quote.provenance,
        QuoteProvenance::DerivedFromBar { bar_date: day(30) }
    );
}

#[tokio::test]
async fn when_nothing_is_known_system_reports_no_quote() {
    // Given: No spot-capable provider answers and there is no bar
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(
        ScriptedAdapter::new(ProviderId::Sina, 1)
            .with_spot_script(Scripted::Fail(SourceError::unavailable("down"))),
    )];
    let resolver = RealtimeResolver::new(&adapters, TIMEOUT, fixed_clock());

    // When/Then: No quote is produced
    assert!(resolver.resolve(None).await.is_none());
}

#[tokio::test]
async fn when_spot_providers_fail_orchestrator_falls_back_to_acquired_series() {
    // Given: A failing spot provider and a series provider
    let sina = Arc::new(
        ScriptedAdapter::new(ProviderId::Sina, 1)
            .with_spot_script(Scripted::Fail(SourceError::unavailable("down"))),
    );
    let orchestrator = AcquisitionOrchestrator::builder(
        AcquisitionConfig::default().with_adapter_timeout(TIMEOUT),
    )
    .with_adapter(sina.clone())
    .with_adapter(Arc::new(
        ScriptedAdapter::new(ProviderId::Kitco, 2).with_series(clean_series(30, 2_000.0)),
    ))
    .with_cache_store(Arc::new(MemoryCacheStore::new()))
    .with_clock(fixed_clock())
    .build();

    // When: The spot price is requested
    let quote = orchestrator.get_spot().await.expect("quote");

    // Then: It is derived from the newest acquired bar
    assert_eq!(quote.price, 2_029.0);
    assert_eq!(
        quote.provenance,
        QuoteProvenance::DerivedFromBar { bar_date: day(29) }
    );

    // And: The failing provider was asked only once
    assert_eq!(sina.spot_calls(), 1);
}

#[tokio::test]
async fn when_no_provider_has_anything_orchestrator_returns_no_spot() {
    // Given: An orchestrator without adapters
    let orchestrator = AcquisitionOrchestrator::builder(AcquisitionConfig::default())
        .with_cache_store(Arc::new(MemoryCacheStore::new()))
        .with_clock(fixed_clock())
        .build();

    // When/Then: No default price is invented
    assert!(orchestrator.get_spot().await.is_none());
}
