//! Validated historical series.

use chrono::NaiveDate;

use super::time::{format_date, parse_date, Granularity};
use crate::error::ValidationError;

/// Minimum number of observations needed to fit a trend.
pub const MIN_OBSERVATIONS: usize = 2;

/// Index-aligned (date, value) observations with strictly increasing dates.
///
/// Built once per request through [`TimeSeries::build`] and never mutated.
/// The date step of the series is inferred at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    granularity: Granularity,
}

impl TimeSeries {
    /// Validate caller-supplied date strings and values.
    ///
    /// Rejects mismatched lengths, fewer than [`MIN_OBSERVATIONS`] points,
    /// unparseable dates, non-finite values and dates that are not strictly
    /// increasing. Nothing is sorted, resampled or interpolated.
    pub fn build<S: AsRef<str>>(dates: &[S], values: &[f64]) -> Result<Self, ValidationError> {
        check_lengths(dates.len(), values.len())?;

        let parsed = dates
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                parse_date(raw.as_ref()).map_err(|e| {
                    ValidationError::new(
                        "dates",
                        format!(
                            "entry {} ('{}') is not a YYYY-MM-DD date: {}",
                            i,
                            raw.as_ref(),
                            e
                        ),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_dates(parsed, values.to_vec())
    }

    /// Validate already-parsed dates.
    pub fn from_dates(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, ValidationError> {
        check_lengths(dates.len(), values.len())?;

        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::new(
                "values",
                format!("entry {} is not a finite number", i),
            ));
        }

        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ValidationError::new(
                "dates",
                format!(
                    "dates must be strictly increasing: entry {} ({}) does not follow entry {} ({})",
                    i + 1,
                    format_date(dates[i + 1]),
                    i,
                    format_date(dates[i])
                ),
            ));
        }

        let granularity = Granularity::infer(&dates);
        Ok(Self {
            dates,
            values,
            granularity,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a validated series; provided for API completeness.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Step between observations, inferred from the input spacing.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// The `periods` dates following the last observation, one step apart.
    ///
    /// Returns `None` when the horizon runs past the supported calendar.
    pub fn future_dates(&self, periods: usize) -> Option<Vec<NaiveDate>> {
        self.granularity.continue_from(&self.dates, periods)
    }
}

fn check_lengths(dates: usize, values: usize) -> Result<(), ValidationError> {
    if dates != values {
        return Err(ValidationError::new(
            "values",
            format!(
                "length {} does not match dates length {}",
                values, dates
            ),
        ));
    }
    if dates < MIN_OBSERVATIONS {
        return Err(ValidationError::new(
            "dates",
            format!(
                "at least {} observations are required, got {}",
                MIN_OBSERVATIONS, dates
            ),
        ));
    }
    Ok(())
}
