use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| String::from("<unformattable>"))
}

pub(crate) mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_iso_date(&value).map_err(D::Error::custom)
    }
}

/// Which price/volume columns a provider actually delivered.
///
/// The date column is always present; a bar cannot exist without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub open: bool,
    pub high: bool,
    pub low: bool,
    pub close: bool,
    pub volume: bool,
}

impl ColumnSet {
    pub const fn full() -> Self {
        Self {
            open: true,
            high: true,
            low: true,
            close: true,
            volume: true,
        }
    }

    pub const fn without_volume() -> Self {
        Self {
            volume: false,
            ..Self::full()
        }
    }

    /// Required price columns the provider omitted, in canonical order.
    pub fn missing_required(self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.open {
            missing.push("open");
        }
        if !self.high {
            missing.push("high");
        }
        if !self.low {
            missing.push("low");
        }
        if !self.close {
            missing.push("close");
        }
        missing
    }

    /// Number of delivered columns, counting the date.
    pub fn present_count(self) -> usize {
        1 + [self.open, self.high, self.low, self.close, self.volume]
            .into_iter()
            .filter(|present| *present)
            .count()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::full()
    }
}

/// One daily record in the canonical schema.
///
/// Price cells are `None` when the provider sent a null for that day. Finite
/// values are enforced here; plausibility (positivity, ordering of
/// high/low) is left to the quality scorer so defective candidates can still
/// be scored rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBar {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: u64,
}

impl CanonicalBar {
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        Self::partial(date, Some(open), Some(high), Some(low), Some(close), volume)
    }

    pub fn partial(
        date: Date,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_optional_finite("open", open)?;
        validate_optional_finite("high", high)?;
        validate_optional_finite("low", low)?;
        validate_optional_finite("close", close)?;

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// Build a bar from provider cells where NaN/inf means "no value".
    pub fn from_lossy(
        date: Date,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: u64,
    ) -> Self {
        Self {
            date,
            open: open.filter(|v| v.is_finite()),
            high: high.filter(|v| v.is_finite()),
            low: low.filter(|v| v.is_finite()),
            close: close.filter(|v| v.is_finite()),
            volume,
        }
    }

    /// Count of absent cells among the price columns that `columns` says exist.
    pub fn null_cells(&self, columns: ColumnSet) -> usize {
        [
            (columns.open, self.open),
            (columns.high, self.high),
            (columns.low, self.low),
            (columns.close, self.close),
        ]
        .into_iter()
        .filter(|(present, value)| *present && value.is_none())
        .count()
    }
}

/// Ascending, date-unique sequence of canonical bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SeriesRepr")]
pub struct CanonicalSeries {
    columns: ColumnSet,
    bars: Vec<CanonicalBar>,
}

#[derive(Deserialize)]
struct SeriesRepr {
    #[serde(default)]
    columns: ColumnSet,
    bars: Vec<CanonicalBar>,
}

impl From<SeriesRepr> for CanonicalSeries {
    fn from(value: SeriesRepr) -> Self {
        Self::from_bars(value.columns, value.bars)
    }
}

impl CanonicalSeries {
    pub fn empty() -> Self {
        Self {
            columns: ColumnSet::full(),
            bars: Vec::new(),
        }
    }

    /// Sort by date and drop duplicate dates, keeping the first occurrence.
    pub fn from_bars(columns: ColumnSet, mut bars: Vec<CanonicalBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);
        Self { columns, bars }
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn bars(&self) -> &[CanonicalBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&CanonicalBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&CanonicalBar> {
        self.bars.last()
    }

    /// Keep only the newest `count` bars.
    pub fn keep_last(mut self, count: usize) -> Self {
        if self.bars.len() > count {
            let excess = self.bars.len() - count;
            self.bars.drain(..excess);
        }
        self
    }

    /// Append a bar strictly newer than the current newest bar.
    pub fn push(&mut self, bar: CanonicalBar) -> Result<(), ValidationError> {
        if let Some(newest) = self.bars.last() {
            if bar.date <= newest.date {
                return Err(ValidationError::BarOutOfOrder {
                    date: format_iso_date(bar.date),
                    newest: format_iso_date(newest.date),
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    pub fn into_bars(self) -> Vec<CanonicalBar> {
        self.bars
    }
}

impl Default for CanonicalSeries {
    fn default() -> Self {
        Self::empty()
    }
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}
