use serde::{Deserialize, Serialize};
use time::Date;

use super::bar::{iso_date, CanonicalBar};
use crate::{ProviderId, UtcDateTime, ValidationError};

/// Where a spot quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteProvenance {
    /// Reported by a provider during this call.
    Live { provider: ProviderId },
    /// Every provider failed; derived from the newest bar of the series.
    DerivedFromBar {
        #[serde(with = "iso_date")]
        bar_date: Date,
    },
}

/// Current intraday price of the instrument. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    pub price: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub observed_at: UtcDateTime,
    pub provenance: QuoteProvenance,
}

impl SpotQuote {
    pub fn live(
        provider: ProviderId,
        price: f64,
        day_high: Option<f64>,
        day_low: Option<f64>,
        change_percent: Option<f64>,
        volume: u64,
        observed_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;

        let day_high = day_high.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(price);
        let day_low = day_low.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(price);
        let change_percent = change_percent.filter(|v| v.is_finite()).unwrap_or(0.0);

        Ok(Self {
            price,
            day_high,
            day_low,
            change_percent,
            volume,
            observed_at,
            provenance: QuoteProvenance::Live { provider },
        })
    }

    /// Last-resort quote built from the newest known bar: zero change, the
    /// bar's close as price. `None` when the bar has no usable close.
    pub fn derived_from(bar: &CanonicalBar, observed_at: UtcDateTime) -> Option<Self> {
        let close = bar.close.filter(|close| *close > 0.0)?;
        Some(Self {
            price: close,
            day_high: bar.high.unwrap_or(close).max(close),
            day_low: bar.low.unwrap_or(close).min(close),
            change_percent: 0.0,
            volume: bar.volume,
            observed_at,
            provenance: QuoteProvenance::DerivedFromBar { bar_date: bar.date },
        })
    }

    pub fn is_live(&self) -> bool {
        matches!(self.provenance, QuoteProvenance::Live { .. })
    }

    pub fn provider(&self) -> Option<ProviderId> {
        match self.provenance {
            QuoteProvenance::Live { provider } => Some(provider),
            QuoteProvenance::DerivedFromBar { .. } => None,
        }
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
