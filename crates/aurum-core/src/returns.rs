use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::iso_date;
use crate::CanonicalSeries;

/// Derived per-bar return fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarReturns {
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Percent change of close against the last known close.
    pub daily_return_pct: f64,
    /// Natural log of close over the previous bar's close.
    pub log_return: f64,
    /// Intraday range as a percent of the low.
    pub high_low_range_pct: f64,
}

/// Computes return fields for every bar of `series`.
///
/// The first bar has no predecessor and gets zero returns. Any field that
/// cannot be computed (absent cells, division by zero) is reported as 0.
pub fn compute(series: &CanonicalSeries) -> Vec<BarReturns> {
    let mut last_known_close: Option<f64> = None;
    let mut previous_close: Option<f64> = None;

    series
        .bars()
        .iter()
        .map(|bar| {
            let daily_return_pct = match (bar.close, last_known_close) {
                (Some(close), Some(prev)) => (close / prev - 1.0) * 100.0,
                _ => 0.0,
            };
            let log_return = match (bar.close, previous_close) {
                (Some(close), Some(prev)) => (close / prev).ln(),
                _ => 0.0,
            };
            let high_low_range_pct = match (bar.high, bar.low) {
                (Some(high), Some(low)) => (high - low) / low * 100.0,
                _ => 0.0,
            };

            previous_close = bar.close;
            if bar.close.is_some() {
                last_known_close = bar.close;
            }

            BarReturns {
                date: bar.date,
                daily_return_pct: finite_or_zero(daily_return_pct),
                log_return: finite_or_zero(log_return),
                high_low_range_pct: finite_or_zero(high_low_range_pct),
            }
        })
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
