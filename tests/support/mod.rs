//! Shared fixtures for behavior tests.
#![allow(dead_code)]

use std::sync::Arc;

use aurum_core::{
    CanonicalBar, CanonicalSeries, ColumnSet, FixedClock, ProviderId, SpotQuote, UtcDateTime,
};
use time::macros::date;
use time::{Date, Duration};

pub const NOW: &str = "2024-03-01T08:00:00Z";

pub fn now() -> UtcDateTime {
    UtcDateTime::parse(NOW).expect("valid timestamp")
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now()))
}

pub fn day(offset: i64) -> Date {
    date!(2024 - 01 - 01) + Duration::days(offset)
}

/// Well-formed bar around `close`.
pub fn bar(date: Date, close: f64) -> CanonicalBar {
    CanonicalBar::new(date, close - 1.0, close + 2.0, close - 3.0, close, 1_000).expect("valid bar")
}

/// `len` consecutive days starting 2024-01-01, gently rising from `base`. Scores 100.
pub fn clean_series(len: usize, base: f64) -> CanonicalSeries {
    let bars = (0..len)
        .map(|index| bar(day(index as i64), base + index as f64))
        .collect();
    CanonicalSeries::from_bars(ColumnSet::full(), bars)
}

/// 30 bars with an 11-day hole in the middle. Scores 95.
pub fn gapped_series() -> CanonicalSeries {
    let bars = (0..30)
        .map(|index| {
            let offset = if index < 15 { index } else { index + 10 };
            bar(day(offset), 2_000.0 + index as f64)
        })
        .collect();
    CanonicalSeries::from_bars(ColumnSet::full(), bars)
}

/// Five bars, one of them with its high below the close. Scores 75.
pub fn short_series_with_high_violation() -> CanonicalSeries {
    let mut bars: Vec<_> = (0..5).map(|index| bar(day(index), 2_000.0 + index as f64)).collect();
    bars[2] = CanonicalBar::new(day(2), 2_001.0, 2_001.5, 1_999.0, 2_002.0, 1_000)
        .expect("valid bar");
    CanonicalSeries::from_bars(ColumnSet::full(), bars)
}

/// Negative close, a huge jump, too few bars, a high violation and a gap. Scores 40.
pub fn defective_series() -> CanonicalSeries {
    let flat = |date: Date, close: f64| {
        CanonicalBar::new(date, close, close + 1.0, close - 1.0, close, 10).expect("valid bar")
    };
    let bars = vec![
        flat(day(0), 100.0),
        flat(day(1), 101.0),
        flat(day(2), -1.0),
        CanonicalBar::new(day(3), 100.0, 99.0, 98.0, 100.5, 10).expect("valid bar"),
        flat(day(14), 101.0),
    ];
    CanonicalSeries::from_bars(ColumnSet::full(), bars)
}

pub fn live_quote(provider: ProviderId, price: f64) -> SpotQuote {
    SpotQuote::live(
        provider,
        price,
        Some(price + 10.0),
        Some(price - 10.0),
        Some(0.25),
        5_000,
        now(),
    )
    .expect("valid quote")
}
