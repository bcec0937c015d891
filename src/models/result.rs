//! The forecast response entity.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::time::format_date;
use crate::error::ForecastError;

/// Named component series, each aligned to the forecast dates.
pub type ComponentMap = BTreeMap<String, Vec<f64>>;

/// Forecast horizon with point values, bounds and optional components.
///
/// Every sequence has the same length and index `i` of each refers to
/// `forecast_dates[i]`. `components` is `None` when components were not
/// requested, which is distinct from `Some` of an empty map.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    forecast_dates: Vec<NaiveDate>,
    forecast_values: Vec<f64>,
    forecast_lower_bound: Vec<f64>,
    forecast_upper_bound: Vec<f64>,
    components: Option<ComponentMap>,
}

impl ForecastResult {
    /// Assemble a result, checking that every sequence is aligned to the dates
    /// and that each point value lies within its bounds.
    pub fn assemble(
        forecast_dates: Vec<NaiveDate>,
        forecast_values: Vec<f64>,
        forecast_lower_bound: Vec<f64>,
        forecast_upper_bound: Vec<f64>,
        components: Option<ComponentMap>,
    ) -> Result<Self, ForecastError> {
        let n = forecast_dates.len();
        let aligned = |name: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(ForecastError::malformed_prediction(format!(
                    "{} has {} entries for {} forecast dates",
                    name, len, n
                )))
            }
        };

        aligned("forecast_values", forecast_values.len())?;
        aligned("forecast_lower_bound", forecast_lower_bound.len())?;
        aligned("forecast_upper_bound", forecast_upper_bound.len())?;
        if let Some(components) = &components {
            for (name, series) in components {
                aligned(&format!("component '{}'", name), series.len())?;
            }
        }

        let crossed = forecast_values
            .iter()
            .zip(&forecast_lower_bound)
            .zip(&forecast_upper_bound)
            .position(|((v, lo), hi)| !(lo <= v && v <= hi));
        if let Some(i) = crossed {
            return Err(ForecastError::malformed_prediction(format!(
                "bounds do not contain the point forecast at index {}",
                i
            )));
        }

        Ok(Self {
            forecast_dates,
            forecast_values,
            forecast_lower_bound,
            forecast_upper_bound,
            components,
        })
    }

    pub fn forecast_dates(&self) -> &[NaiveDate] {
        &self.forecast_dates
    }

    /// Forecast dates in `YYYY-MM-DD` form.
    pub fn forecast_date_strings(&self) -> Vec<String> {
        self.forecast_dates.iter().copied().map(format_date).collect()
    }

    pub fn forecast_values(&self) -> &[f64] {
        &self.forecast_values
    }

    pub fn forecast_lower_bound(&self) -> &[f64] {
        &self.forecast_lower_bound
    }

    pub fn forecast_upper_bound(&self) -> &[f64] {
        &self.forecast_upper_bound
    }

    pub fn components(&self) -> Option<&ComponentMap> {
        self.components.as_ref()
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.forecast_dates.len()
    }

    /// Consume the result into its parts: dates, values, lower, upper, components.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        Vec<NaiveDate>,
        Vec<f64>,
        Vec<f64>,
        Vec<f64>,
        Option<ComponentMap>,
    ) {
        (
            self.forecast_dates,
            self.forecast_values,
            self.forecast_lower_bound,
            self.forecast_upper_bound,
            self.components,
        )
    }
}
