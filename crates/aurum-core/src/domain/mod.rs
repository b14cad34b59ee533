//! # Domain Models
//!
//! Canonical types every source adapter normalizes into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CanonicalBar`] | One daily OHLCV record |
//! | [`CanonicalSeries`] | Ascending, date-unique run of bars plus the delivered [`ColumnSet`] |
//! | [`SpotQuote`] | Current intraday price with [`QuoteProvenance`] |
//! | [`SeriesKey`] | Validated cache key of a logical series |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Bars hold finite numbers only; plausibility is judged by the quality
//! scorer, not by construction, so that a defective provider payload can be
//! scored and rejected instead of disappearing.

mod bar;
mod key;
mod quote;
mod timestamp;

pub(crate) use bar::iso_date;
pub use bar::{format_iso_date, parse_iso_date, CanonicalBar, CanonicalSeries, ColumnSet};
pub use key::SeriesKey;
pub use quote::{QuoteProvenance, SpotQuote};
pub use timestamp::UtcDateTime;
