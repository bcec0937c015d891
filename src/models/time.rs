//! Calendar date handling: parsing, formatting and step inference.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Spacing between consecutive observations of a series.
///
/// Day steps cover daily and weekly data. Month steps keep the day of
/// month (monthly, quarterly, yearly data), and month-end steps keep
/// landing on the last day of each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "step", rename_all = "snake_case")]
pub enum Granularity {
    Days(u32),
    Months(u32),
    MonthEnd(u32),
}

impl Granularity {
    /// Infer the step from strictly increasing dates.
    ///
    /// The step is the most frequent spacing, so isolated gaps do not
    /// change the result. Ties resolve to the smaller step. Fewer than two
    /// dates default to one day.
    pub fn infer(dates: &[NaiveDate]) -> Granularity {
        if dates.len() < 2 {
            return Granularity::Days(1);
        }

        let month_steps: Vec<i64> = dates
            .windows(2)
            .map(|w| month_index(w[1]) - month_index(w[0]))
            .collect();
        let whole_months = month_steps.iter().all(|&m| m > 0);

        if whole_months && dates.iter().all(|d| is_month_end(*d)) {
            return Granularity::MonthEnd(most_frequent(&month_steps));
        }

        // Short months clamp the anchor day, so the 30th falls on Feb 28.
        let anchor_day = month_anchor(dates);
        if whole_months && dates.iter().all(|d| d.day() == anchor_day.min(days_in_month(*d))) {
            return Granularity::Months(most_frequent(&month_steps));
        }

        let day_steps: Vec<i64> = dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();
        Granularity::Days(most_frequent(&day_steps))
    }

    /// The date `steps` steps after `from`, or `None` past the calendar range.
    pub fn advance(&self, from: NaiveDate, steps: u32) -> Option<NaiveDate> {
        match *self {
            Granularity::Days(n) => {
                let days = u64::from(n).checked_mul(u64::from(steps))?;
                from.checked_add_days(Days::new(days))
            }
            Granularity::Months(n) => {
                from.checked_add_months(Months::new(n.checked_mul(steps)?))
            }
            Granularity::MonthEnd(n) => {
                let months = n.checked_mul(steps)?.checked_add(1)?;
                NaiveDate::from_ymd_opt(from.year(), from.month(), 1)?
                    .checked_add_months(Months::new(months))?
                    .pred_opt()
            }
        }
    }

    /// The `count` consecutive dates following `last`.
    pub fn sequence_after(&self, last: NaiveDate, count: usize) -> Option<Vec<NaiveDate>> {
        (1..=count)
            .map(|k| u32::try_from(k).ok().and_then(|k| self.advance(last, k)))
            .collect()
    }

    /// The `count` dates continuing `history`.
    ///
    /// Month steps keep the day of month the history is anchored on, even
    /// when the last observation was clamped into a short month.
    pub fn continue_from(&self, history: &[NaiveDate], count: usize) -> Option<Vec<NaiveDate>> {
        let last = *history.last()?;
        let n = match *self {
            Granularity::Months(n) => n,
            _ => return self.sequence_after(last, count),
        };

        let anchor_day = month_anchor(history);
        let base = NaiveDate::from_ymd_opt(last.year(), last.month(), 1)?;
        (1..=count)
            .map(|k| {
                let months = n.checked_mul(u32::try_from(k).ok()?)?;
                let first = base.checked_add_months(Months::new(months))?;
                first.with_day(anchor_day.min(days_in_month(first)))
            })
            .collect()
    }
}

/// Largest day of month seen, the day a monthly series is anchored on.
fn month_anchor(dates: &[NaiveDate]) -> u32 {
    dates.iter().map(|d| d.day()).max().unwrap_or(1)
}

fn days_in_month(date: NaiveDate) -> u32 {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map_or(31, |end| end.day())
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map(|next| next.day() == 1).unwrap_or(true)
}

fn most_frequent(steps: &[i64]) -> u32 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &step in steps.iter().filter(|&&s| s > 0) {
        *counts.entry(step).or_default() += 1;
    }
    // BTreeMap iterates ascending, so the first maximum is the smallest step.
    let mut best: Option<(i64, usize)> = None;
    for (step, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((step, count));
        }
    }
    best.and_then(|(step, _)| u32::try_from(step).ok()).unwrap_or(1)
}
