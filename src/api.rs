//! Public API surface for the forecast service.
//!
//! Wire types for a forecast request and its response. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::models::{ComponentMap, ModelConfig, ModelParameters, ParameterSpec};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{ForecastResult, TimeSeries};

/// Horizon used when a request omits `periods`.
pub const DEFAULT_PERIODS: i64 = 30;

fn default_periods() -> i64 {
    DEFAULT_PERIODS
}

/// Historical observations as sent by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    /// ISO dates (`YYYY-MM-DD`), strictly increasing
    pub dates: Vec<String>,
    /// One value per date
    pub values: Vec<f64>,
}

/// Request body for a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub data: TimeSeriesData,
    /// Number of future steps (default: 30)
    #[serde(default = "default_periods")]
    pub periods: i64,
    /// Partial parameter overrides; absent or null means all defaults
    #[serde(default)]
    pub model_parameters: Option<ModelParameters>,
    /// Include per-component series in the response (default: false)
    #[serde(default)]
    pub return_components: bool,
}

/// A request that passed validation, ready for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub series: TimeSeries,
    pub config: ModelConfig,
    pub periods: usize,
    pub return_components: bool,
}

impl ForecastRequest {
    /// Decode a request from parsed JSON.
    ///
    /// A field with the wrong type is reported as a [`ValidationError`]
    /// naming its path (e.g. `model_parameters.growth`); problems with the
    /// body as a whole use the field name `body`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_path_to_error::deserialize(value).map_err(|e| {
            let path = e.path().to_string();
            let field = if path == "." { "body".to_string() } else { path };
            ValidationError::new(field, e.into_inner().to_string())
        })
    }

    /// Validate the series, the horizon and the parameter overrides.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let series = TimeSeries::build(&self.data.dates, &self.data.values)?;

        let periods = usize::try_from(self.periods)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| {
                ValidationError::new(
                    "periods",
                    format!("must be at least 1, got {}", self.periods),
                )
            })?;

        let config = ModelConfig::build(self.model_parameters.as_ref())?;

        Ok(ValidatedRequest {
            series,
            config,
            periods,
            return_components: self.return_components,
        })
    }
}

/// Response body for a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast_dates: Vec<String>,
    pub forecast_values: Vec<f64>,
    pub forecast_lower_bound: Vec<f64>,
    pub forecast_upper_bound: Vec<f64>,
    /// Present only when components were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentMap>,
}

impl From<ForecastResult> for ForecastResponse {
    fn from(result: ForecastResult) -> Self {
        let forecast_dates = result.forecast_date_strings();
        let (_, values, lower, upper, components) = result.into_parts();
        Self {
            forecast_dates,
            forecast_values: values,
            forecast_lower_bound: lower,
            forecast_upper_bound: upper,
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults;

    fn request(json: &str) -> ForecastRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let req = request(r#"{"data": {"dates": ["2024-01-01", "2024-01-02"], "values": [1, 2]}}"#);
        assert_eq!(req.periods, 30);
        assert!(!req.return_components);
        assert!(req.model_parameters.is_none());

        let validated = req.validate().unwrap();
        assert_eq!(validated.periods, 30);
        assert_eq!(validated.config, defaults());
        assert_eq!(validated.series.len(), 2);
    }

    #[test]
    fn test_null_model_parameters() {
        let req = request(
            r#"{"data": {"dates": ["2024-01-01", "2024-01-02"], "values": [1, 2]},
                "model_parameters": null}"#,
        );
        assert_eq!(req.validate().unwrap().config, defaults());
    }

    #[test]
    fn test_partial_model_parameters() {
        let req = request(
            r#"{"data": {"dates": ["2024-01-01", "2024-01-02"], "values": [1, 2]},
                "model_parameters": {"weekly_seasonality": false, "changepoint_prior_scale": null}}"#,
        );
        let config = req.validate().unwrap().config;
        assert!(!config.weekly_seasonality());
        assert_eq!(config.changepoint_prior_scale(), 0.05);
    }

    #[test]
    fn test_non_positive_periods() {
        for periods in [0, -3] {
            let req = ForecastRequest {
                data: TimeSeriesData {
                    dates: vec!["2024-01-01".into(), "2024-01-02".into()],
                    values: vec![1.0, 2.0],
                },
                periods,
                model_parameters: None,
                return_components: false,
            };
            assert_eq!(req.validate().unwrap_err().field, "periods");
        }
    }

    #[test]
    fn test_series_checked_before_parameters() {
        let req = request(
            r#"{"data": {"dates": ["2024-01-01"], "values": [1]},
                "model_parameters": {"growth": "flat"}}"#,
        );
        assert_eq!(req.validate().unwrap_err().field, "dates");
    }

    #[test]
    fn test_from_json_names_mistyped_field() {
        let err = ForecastRequest::from_json(serde_json::json!({
            "data": {"dates": ["2024-01-01", "2024-01-02"], "values": [1, 2]},
            "model_parameters": {"growth": 5}
        }))
        .unwrap_err();
        assert_eq!(err.field, "model_parameters.growth");

        let err = ForecastRequest::from_json(serde_json::json!({
            "data": {"dates": ["2024-01-01"], "values": ["one"]}
        }))
        .unwrap_err();
        assert_eq!(err.field, "data.values[0]");
    }

    #[test]
    fn test_from_json_missing_data() {
        let err = ForecastRequest::from_json(serde_json::json!({"periods": 3})).unwrap_err();
        assert_eq!(err.field, "body");
        assert!(err.reason.contains("data"));
    }

    #[test]
    fn test_response_omits_absent_components() {
        let result = ForecastResult::assemble(
            vec![crate::models::parse_date("2024-02-01").unwrap()],
            vec![1.0],
            vec![0.5],
            vec![1.5],
            None,
        )
        .unwrap();
        let json = serde_json::to_value(ForecastResponse::from(result)).unwrap();
        assert_eq!(json["forecast_dates"][0], "2024-02-01");
        assert!(json.get("components").is_none());
    }
}
