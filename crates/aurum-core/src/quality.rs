//! Quality scoring of candidate series.
//!
//! Scoring starts at 100 and subtracts one penalty per defect class found.
//! Classes are detected independently, so several penalties can apply in one
//! pass. The result is clamped to `0..=100`. Penalties and thresholds live in
//! [`QualityPolicy`]; its defaults are the production values.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{CanonicalBar, CanonicalSeries};

/// Penalty table and thresholds used by [`QualityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPolicy {
    pub validity_floor: u8,

    pub missing_columns_penalty: u8,
    pub null_ratio_high: f64,
    pub null_ratio_high_penalty: u8,
    pub null_ratio_low: f64,
    pub null_ratio_low_penalty: u8,

    pub non_positive_close_penalty: u8,
    pub max_close: f64,
    pub excessive_close_penalty: u8,
    pub max_abs_return: f64,
    pub excessive_return_penalty: u8,

    pub high_violation_penalty: u8,
    pub low_violation_penalty: u8,

    pub min_bars: usize,
    pub too_few_bars_penalty: u8,
    pub max_gap_days: i64,
    pub gap_penalty: u8,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            validity_floor: 60,
            missing_columns_penalty: 30,
            null_ratio_high: 0.10,
            null_ratio_high_penalty: 20,
            null_ratio_low: 0.05,
            null_ratio_low_penalty: 10,
            non_positive_close_penalty: 20,
            max_close: 100_000.0,
            excessive_close_penalty: 15,
            max_abs_return: 0.5,
            excessive_return_penalty: 10,
            high_violation_penalty: 10,
            low_violation_penalty: 10,
            min_bars: 10,
            too_few_bars_penalty: 15,
            max_gap_days: 7,
            gap_penalty: 5,
        }
    }
}

/// One detected defect class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityIssue {
    EmptySeries,
    MissingColumns { columns: Vec<String> },
    ManyNulls { ratio: f64 },
    SomeNulls { ratio: f64 },
    NonPositiveClose,
    ExcessiveClose,
    ExcessiveReturn,
    HighBelowBody { bars: usize },
    LowAboveBody { bars: usize },
    TooFewBars { bars: usize },
    DateGap { days: i64 },
}

impl Display for QualityIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySeries => f.write_str("empty series"),
            Self::MissingColumns { columns } => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Self::ManyNulls { ratio } => write!(f, "too many null values: {:.1}%", ratio * 100.0),
            Self::SomeNulls { ratio } => write!(f, "elevated null values: {:.1}%", ratio * 100.0),
            Self::NonPositiveClose => f.write_str("non-positive close price"),
            Self::ExcessiveClose => f.write_str("implausibly high close price"),
            Self::ExcessiveReturn => f.write_str("implausible single-period price move"),
            Self::HighBelowBody { bars } => {
                write!(f, "{bars} bars with high below open or close")
            }
            Self::LowAboveBody { bars } => write!(f, "{bars} bars with low above open or close"),
            Self::TooFewBars { bars } => write!(f, "too few bars: only {bars}"),
            Self::DateGap { days } => write!(f, "date gap of {days} days"),
        }
    }
}

/// Score of one candidate series. Produced fresh per candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u8,
    pub issues: Vec<QualityIssue>,
    pub valid: bool,
}

impl QualityReport {
    fn empty_series() -> Self {
        Self {
            score: 0,
            issues: vec![QualityIssue::EmptySeries],
            valid: false,
        }
    }

    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Pure, deterministic scorer.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    policy: QualityPolicy,
}

impl QualityScorer {
    pub fn new(policy: QualityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    pub fn score(&self, series: &CanonicalSeries) -> QualityReport {
        if series.is_empty() {
            return QualityReport::empty_series();
        }

        let policy = &self.policy;
        let columns = series.columns();
        let bars = series.bars();
        let mut issues = Vec::new();
        let mut score: i32 = 100;
        let mut penalize = |issue: QualityIssue, penalty: u8| {
            issues.push(issue);
            score -= i32::from(penalty);
        };

        let missing = columns.missing_required();
        if !missing.is_empty() {
            penalize(
                QualityIssue::MissingColumns {
                    columns: missing.iter().map(|c| (*c).to_owned()).collect(),
                },
                policy.missing_columns_penalty,
            );
        }

        let total_cells = bars.len() * columns.present_count();
        let null_cells: usize = bars.iter().map(|bar| bar.null_cells(columns)).sum();
        let ratio = null_cells as f64 / total_cells as f64;
        if ratio > policy.null_ratio_high {
            penalize(QualityIssue::ManyNulls { ratio }, policy.null_ratio_high_penalty);
        } else if ratio > policy.null_ratio_low {
            penalize(QualityIssue::SomeNulls { ratio }, policy.null_ratio_low_penalty);
        }

        if columns.close {
            let closes: Vec<f64> = bars.iter().filter_map(|bar| bar.close).collect();

            if closes.iter().any(|close| *close <= 0.0) {
                penalize(QualityIssue::NonPositiveClose, policy.non_positive_close_penalty);
            }
            if closes.iter().any(|close| *close > policy.max_close) {
                penalize(QualityIssue::ExcessiveClose, policy.excessive_close_penalty);
            }
            if has_excessive_return(&closes, policy.max_abs_return) {
                penalize(QualityIssue::ExcessiveReturn, policy.excessive_return_penalty);
            }
        }

        if columns.open && columns.high && columns.low && columns.close {
            let high_violations = bars.iter().filter(|bar| high_below_body(bar)).count();
            if high_violations > 0 {
                penalize(
                    QualityIssue::HighBelowBody {
                        bars: high_violations,
                    },
                    policy.high_violation_penalty,
                );
            }

            let low_violations = bars.iter().filter(|bar| low_above_body(bar)).count();
            if low_violations > 0 {
                penalize(
                    QualityIssue::LowAboveBody {
                        bars: low_violations,
                    },
                    policy.low_violation_penalty,
                );
            }
        }

        if bars.len() < policy.min_bars {
            penalize(
                QualityIssue::TooFewBars { bars: bars.len() },
                policy.too_few_bars_penalty,
            );
        }

        let widest_gap = bars
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).whole_days())
            .max();
        if let Some(days) = widest_gap.filter(|days| *days > policy.max_gap_days) {
            penalize(QualityIssue::DateGap { days }, policy.gap_penalty);
        }

        let score = score.clamp(0, 100) as u8;
        QualityReport {
            score,
            issues,
            valid: score >= policy.validity_floor,
        }
    }
}

/// Relative change between consecutive present closes. A zero previous close
/// with a non-zero current close counts as an unbounded move; 0 -> 0 does not.
fn has_excessive_return(closes: &[f64], max_abs_return: f64) -> bool {
    closes.windows(2).any(|pair| {
        let change = ((pair[1] - pair[0]) / pair[0]).abs();
        !change.is_nan() && change > max_abs_return
    })
}

fn high_below_body(bar: &CanonicalBar) -> bool {
    let Some(high) = bar.high else {
        return false;
    };
    bar.open.is_some_and(|open| high < open) || bar.close.is_some_and(|close| high < close)
}

fn low_above_body(bar: &CanonicalBar) -> bool {
    let Some(low) = bar.low else {
        return false;
    };
    bar.open.is_some_and(|open| low > open) || bar.close.is_some_and(|close| low > close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnSet;
    use time::{Date, Duration, Month};

    fn start() -> Date {
        Date::from_calendar_date(2023, Month::January, 2).expect("valid date")
    }

    fn clean_series(len: usize) -> CanonicalSeries {
        let bars = (0..len)
            .map(|i| {
                let close = 1900.0 + (i % 17) as f64;
                CanonicalBar::new(
                    start() + Duration::days(i as i64),
                    close - 2.0,
                    close + 5.0,
                    close - 5.0,
                    close,
                    1_000,
                )
                .expect("valid bar")
            })
            .collect();
        CanonicalSeries::from_bars(ColumnSet::full(), bars)
    }

    fn with_bar(series: &CanonicalSeries, index: usize, bar: CanonicalBar) -> CanonicalSeries {
        let mut bars = series.bars().to_vec();
        bars[index] = bar;
        CanonicalSeries::from_bars(series.columns(), bars)
    }

    #[test]
    fn clean_long_series_scores_full_marks() {
        let report = QualityScorer::default().score(&clean_series(250));

        assert_eq!(report.score, 100);
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn empty_series_short_circuits() {
        let report = QualityScorer::default().score(&CanonicalSeries::empty());

        assert_eq!(report.score, 0);
        assert!(!report.valid);
        assert_eq!(report.issue_messages(), vec!["empty series"]);
    }

    #[test]
    fn non_positive_close_costs_twenty_points() {
        let series = clean_series(200);
        let date = series.bars()[100].date;
        let series = with_bar(
            &series,
            100,
            CanonicalBar::new(date, 0.0, 0.0, 0.0, 0.0, 0).expect("valid bar"),
        );

        let report = QualityScorer::default().score(&series);

        assert!(report.score <= 80);
        assert!(report.issues.contains(&QualityIssue::NonPositiveClose));
        // The drop to zero is also an excessive move.
        assert!(report.issues.contains(&QualityIssue::ExcessiveReturn));
    }

    #[test]
    fn high_and_low_violations_are_counted() {
        let series = clean_series(30);
        let first = series.bars()[0].date;
        let second = series.bars()[1].date;
        let series = with_bar(
            &series,
            0,
            CanonicalBar::new(first, 1910.0, 1905.0, 1895.0, 1900.0, 0).expect("valid bar"),
        );
        let series = with_bar(
            &series,
            1,
            CanonicalBar::new(second, 1900.0, 1910.0, 1902.0, 1901.0, 0).expect("valid bar"),
        );

        let report = QualityScorer::default().score(&series);

        assert_eq!(report.score, 80);
        assert!(report.issues.contains(&QualityIssue::HighBelowBody { bars: 1 }));
        assert!(report.issues.contains(&QualityIssue::LowAboveBody { bars: 1 }));
        assert_eq!(
            report.issues[0].to_string(),
            "1 bars with high below open or close"
        );
    }

    #[test]
    fn short_series_with_gap_loses_twenty_points() {
        let bars = vec![
            CanonicalBar::new(start(), 1.0, 1.0, 1.0, 1.0, 0).expect("valid bar"),
            CanonicalBar::new(start() + Duration::days(10), 1.0, 1.0, 1.0, 1.0, 0)
                .expect("valid bar"),
        ];
        let report =
            QualityScorer::default().score(&CanonicalSeries::from_bars(ColumnSet::full(), bars));

        assert_eq!(report.score, 80);
        assert!(report.valid);
        assert!(report.issues.contains(&QualityIssue::TooFewBars { bars: 2 }));
        assert!(report.issues.contains(&QualityIssue::DateGap { days: 10 }));
    }

    #[test]
    fn null_ratio_bands_apply_one_penalty() {
        // 20 bars x 6 columns = 120 cells.
        let series = clean_series(20);
        let mut bars = series.bars().to_vec();
        for bar in bars.iter_mut().take(7) {
            bar.open = None;
        }
        let some = CanonicalSeries::from_bars(ColumnSet::full(), bars.clone());
        let report = QualityScorer::default().score(&some);
        assert_eq!(report.score, 90);
        assert!(matches!(report.issues[0], QualityIssue::SomeNulls { .. }));

        for bar in bars.iter_mut().take(13) {
            bar.open = None;
        }
        let many = CanonicalSeries::from_bars(ColumnSet::full(), bars);
        let report = QualityScorer::default().score(&many);
        assert_eq!(report.score, 80);
        assert!(matches!(report.issues[0], QualityIssue::ManyNulls { .. }));
    }

    #[test]
    fn missing_close_column_skips_price_checks() {
        let bars = clean_series(20)
            .into_bars()
            .into_iter()
            .map(|mut bar| {
                bar.close = None;
                bar
            })
            .collect();
        let columns = ColumnSet {
            close: false,
            ..ColumnSet::full()
        };
        let report = QualityScorer::default().score(&CanonicalSeries::from_bars(columns, bars));

        assert_eq!(report.score, 70);
        assert_eq!(
            report.issues,
            vec![QualityIssue::MissingColumns {
                columns: vec![String::from("close")]
            }]
        );
    }

    #[test]
    fn score_clamps_at_zero() {
        let policy = QualityPolicy {
            too_few_bars_penalty: 150,
            ..QualityPolicy::default()
        };
        let report = QualityScorer::new(policy).score(&clean_series(3));

        assert_eq!(report.score, 0);
        assert!(!report.valid);
    }

    #[test]
    fn scoring_is_idempotent() {
        let scorer = QualityScorer::default();
        let series = clean_series(12);
        assert_eq!(scorer.score(&series), scorer.score(&series));
    }
}
