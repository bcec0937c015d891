//! Forecasting model parameters: defaults, raw overrides and validation.
//!
//! [`DEFAULT_MODEL_CONFIG`] is the single definition of the defaults. Both
//! the standalone [`defaults`] query and the merge step in
//! [`ModelConfig::build`] read from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ValidationError;

/// How seasonal effects combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
    Multiplicative,
}

impl SeasonalityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        }
    }
}

impl FromStr for SeasonalityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "additive" => Ok(SeasonalityMode::Additive),
            "multiplicative" => Ok(SeasonalityMode::Multiplicative),
            other => Err(format!(
                "'{}' is not one of 'additive', 'multiplicative'",
                other
            )),
        }
    }
}

impl fmt::Display for SeasonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Growth {
    Linear,
    /// Saturating growth between `floor` and `cap`.
    Logistic,
}

impl Growth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Growth::Linear => "linear",
            Growth::Logistic => "logistic",
        }
    }
}

impl FromStr for Growth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Growth::Linear),
            "logistic" => Ok(Growth::Logistic),
            other => Err(format!("'{}' is not one of 'linear', 'logistic'", other)),
        }
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, fully populated model configuration.
///
/// Fields are private so a value can only come from [`ModelConfig::build`]
/// or [`defaults`]; every instance satisfies the positivity, range and
/// logistic capacity rules. `cap` and `floor` are `Some` exactly when growth
/// is logistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelConfig {
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    holidays_prior_scale: f64,
    seasonality_mode: SeasonalityMode,
    yearly_seasonality: bool,
    weekly_seasonality: bool,
    daily_seasonality: bool,
    growth: Growth,
    cap: Option<f64>,
    floor: Option<f64>,
    n_changepoints: u32,
    changepoint_range: f64,
}

/// The default parameter set.
pub const DEFAULT_MODEL_CONFIG: ModelConfig = ModelConfig {
    changepoint_prior_scale: 0.05,
    seasonality_prior_scale: 10.0,
    holidays_prior_scale: 10.0,
    seasonality_mode: SeasonalityMode::Additive,
    yearly_seasonality: true,
    weekly_seasonality: true,
    daily_seasonality: false,
    growth: Growth::Linear,
    cap: None,
    floor: None,
    n_changepoints: 25,
    changepoint_range: 0.8,
};

/// Default model parameters.
pub fn defaults() -> ModelConfig {
    DEFAULT_MODEL_CONFIG
}

/// Caller-supplied parameter overrides, as received on the wire.
///
/// Every field is optional; absent and `null` both mean "use the default".
/// Enum fields stay strings here so a bad value is reported as a
/// [`ValidationError`] on that field rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub changepoint_prior_scale: Option<f64>,
    pub seasonality_prior_scale: Option<f64>,
    pub holidays_prior_scale: Option<f64>,
    pub seasonality_mode: Option<String>,
    pub yearly_seasonality: Option<bool>,
    pub weekly_seasonality: Option<bool>,
    pub daily_seasonality: Option<bool>,
    pub growth: Option<String>,
    pub cap: Option<f64>,
    pub floor: Option<f64>,
    pub n_changepoints: Option<i64>,
    pub changepoint_range: Option<f64>,
}

impl From<ModelConfig> for ModelParameters {
    fn from(config: ModelConfig) -> Self {
        Self {
            changepoint_prior_scale: Some(config.changepoint_prior_scale),
            seasonality_prior_scale: Some(config.seasonality_prior_scale),
            holidays_prior_scale: Some(config.holidays_prior_scale),
            seasonality_mode: Some(config.seasonality_mode.as_str().to_string()),
            yearly_seasonality: Some(config.yearly_seasonality),
            weekly_seasonality: Some(config.weekly_seasonality),
            daily_seasonality: Some(config.daily_seasonality),
            growth: Some(config.growth.as_str().to_string()),
            cap: config.cap,
            floor: config.floor,
            n_changepoints: Some(i64::from(config.n_changepoints)),
            changepoint_range: Some(config.changepoint_range),
        }
    }
}

impl ModelConfig {
    /// Merge `raw` over the defaults field by field and validate the result.
    ///
    /// `None` yields exactly [`defaults`]. Under linear growth any supplied
    /// `cap`/`floor` are ignored.
    pub fn build(raw: Option<&ModelParameters>) -> Result<ModelConfig, ValidationError> {
        let base = DEFAULT_MODEL_CONFIG;
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(base),
        };

        let seasonality_mode = match raw.seasonality_mode.as_deref() {
            Some(s) => s
                .parse::<SeasonalityMode>()
                .map_err(|reason| ValidationError::new("seasonality_mode", reason))?,
            None => base.seasonality_mode,
        };
        let growth = match raw.growth.as_deref() {
            Some(s) => s
                .parse::<Growth>()
                .map_err(|reason| ValidationError::new("growth", reason))?,
            None => base.growth,
        };

        let n_changepoints = match raw.n_changepoints {
            Some(n) => u32::try_from(n).map_err(|_| {
                ValidationError::new(
                    "n_changepoints",
                    format!("must be a non-negative integer, got {}", n),
                )
            })?,
            None => base.n_changepoints,
        };

        let changepoint_range = raw.changepoint_range.unwrap_or(base.changepoint_range);
        if !(changepoint_range.is_finite() && changepoint_range > 0.0 && changepoint_range <= 1.0)
        {
            return Err(ValidationError::new(
                "changepoint_range",
                format!("must be in (0, 1], got {}", changepoint_range),
            ));
        }

        let (cap, floor) = match growth {
            Growth::Logistic => {
                let (cap, floor) = logistic_capacity(raw.cap, raw.floor)?;
                (Some(cap), Some(floor))
            }
            Growth::Linear => {
                if raw.cap.is_some() || raw.floor.is_some() {
                    log::warn!("ignoring cap/floor supplied with linear growth");
                }
                (None, None)
            }
        };

        Ok(ModelConfig {
            changepoint_prior_scale: positive(
                "changepoint_prior_scale",
                raw.changepoint_prior_scale,
                base.changepoint_prior_scale,
            )?,
            seasonality_prior_scale: positive(
                "seasonality_prior_scale",
                raw.seasonality_prior_scale,
                base.seasonality_prior_scale,
            )?,
            holidays_prior_scale: positive(
                "holidays_prior_scale",
                raw.holidays_prior_scale,
                base.holidays_prior_scale,
            )?,
            seasonality_mode,
            yearly_seasonality: raw.yearly_seasonality.unwrap_or(base.yearly_seasonality),
            weekly_seasonality: raw.weekly_seasonality.unwrap_or(base.weekly_seasonality),
            daily_seasonality: raw.daily_seasonality.unwrap_or(base.daily_seasonality),
            growth,
            cap,
            floor,
            n_changepoints,
            changepoint_range,
        })
    }

    pub fn changepoint_prior_scale(&self) -> f64 {
        self.changepoint_prior_scale
    }

    pub fn seasonality_prior_scale(&self) -> f64 {
        self.seasonality_prior_scale
    }

    pub fn holidays_prior_scale(&self) -> f64 {
        self.holidays_prior_scale
    }

    pub fn seasonality_mode(&self) -> SeasonalityMode {
        self.seasonality_mode
    }

    pub fn yearly_seasonality(&self) -> bool {
        self.yearly_seasonality
    }

    pub fn weekly_seasonality(&self) -> bool {
        self.weekly_seasonality
    }

    pub fn daily_seasonality(&self) -> bool {
        self.daily_seasonality
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn cap(&self) -> Option<f64> {
        self.cap
    }

    pub fn floor(&self) -> Option<f64> {
        self.floor
    }

    /// `(cap, floor)` under logistic growth.
    pub fn capacity(&self) -> Option<(f64, f64)> {
        self.cap.zip(self.floor)
    }

    pub fn n_changepoints(&self) -> u32 {
        self.n_changepoints
    }

    pub fn changepoint_range(&self) -> f64 {
        self.changepoint_range
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        DEFAULT_MODEL_CONFIG
    }
}

fn positive(field: &str, value: Option<f64>, default: f64) -> Result<f64, ValidationError> {
    let value = value.unwrap_or(default);
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::new(
            field,
            format!("must be a positive number, got {}", value),
        ))
    }
}

fn logistic_capacity(cap: Option<f64>, floor: Option<f64>) -> Result<(f64, f64), ValidationError> {
    let cap = cap.ok_or_else(|| {
        ValidationError::new("cap", "required when growth is 'logistic'")
    })?;
    let floor = floor.ok_or_else(|| {
        ValidationError::new("floor", "required when growth is 'logistic'")
    })?;
    if !cap.is_finite() {
        return Err(ValidationError::new("cap", "must be a finite number"));
    }
    if !floor.is_finite() {
        return Err(ValidationError::new("floor", "must be a finite number"));
    }
    if cap <= floor {
        return Err(ValidationError::new(
            "cap",
            format!("must be greater than floor ({}), got {}", floor, cap),
        ));
    }
    Ok((cap, floor))
}

/// Description of one tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub default: serde_json::Value,
    pub constraint: &'static str,
    pub description: &'static str,
}

/// Catalog of every parameter with its default and constraint.
pub fn parameter_catalog() -> Vec<ParameterSpec> {
    let d = DEFAULT_MODEL_CONFIG;
    vec![
        ParameterSpec {
            name: "changepoint_prior_scale",
            kind: "number",
            default: json!(d.changepoint_prior_scale),
            constraint: "> 0",
            description: "Flexibility of trend changes; larger values let the trend bend more",
        },
        ParameterSpec {
            name: "seasonality_prior_scale",
            kind: "number",
            default: json!(d.seasonality_prior_scale),
            constraint: "> 0",
            description: "Strength of the seasonal terms; larger values allow stronger patterns",
        },
        ParameterSpec {
            name: "holidays_prior_scale",
            kind: "number",
            default: json!(d.holidays_prior_scale),
            constraint: "> 0",
            description: "Strength of holiday effects",
        },
        ParameterSpec {
            name: "seasonality_mode",
            kind: "string",
            default: json!(d.seasonality_mode.as_str()),
            constraint: "additive | multiplicative",
            description: "Whether seasonal effects are added to or multiplied with the trend",
        },
        ParameterSpec {
            name: "yearly_seasonality",
            kind: "boolean",
            default: json!(d.yearly_seasonality),
            constraint: "",
            description: "Fit a yearly seasonal component",
        },
        ParameterSpec {
            name: "weekly_seasonality",
            kind: "boolean",
            default: json!(d.weekly_seasonality),
            constraint: "",
            description: "Fit a weekly seasonal component",
        },
        ParameterSpec {
            name: "daily_seasonality",
            kind: "boolean",
            default: json!(d.daily_seasonality),
            constraint: "",
            description: "Fit a daily seasonal component",
        },
        ParameterSpec {
            name: "growth",
            kind: "string",
            default: json!(d.growth.as_str()),
            constraint: "linear | logistic",
            description: "Trend shape; logistic saturates between floor and cap",
        },
        ParameterSpec {
            name: "cap",
            kind: "number",
            default: json!(d.cap),
            constraint: "required and > floor when growth is logistic",
            description: "Upper saturation level for logistic growth",
        },
        ParameterSpec {
            name: "floor",
            kind: "number",
            default: json!(d.floor),
            constraint: "required when growth is logistic",
            description: "Lower saturation level for logistic growth",
        },
        ParameterSpec {
            name: "n_changepoints",
            kind: "integer",
            default: json!(d.n_changepoints),
            constraint: ">= 0",
            description: "Number of potential trend changepoints",
        },
        ParameterSpec {
            name: "changepoint_range",
            kind: "number",
            default: json!(d.changepoint_range),
            constraint: "(0, 1]",
            description: "Fraction of the history where changepoints may be placed",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_overrides_equals_defaults() {
        assert_eq!(ModelConfig::build(None).unwrap(), defaults());
        assert_eq!(
            ModelConfig::build(Some(&ModelParameters::default())).unwrap(),
            defaults()
        );
    }

    #[test]
    fn test_default_values() {
        let d = defaults();
        assert_eq!(d.changepoint_prior_scale(), 0.05);
        assert_eq!(d.seasonality_prior_scale(), 10.0);
        assert_eq!(d.holidays_prior_scale(), 10.0);
        assert_eq!(d.seasonality_mode(), SeasonalityMode::Additive);
        assert!(d.yearly_seasonality());
        assert!(d.weekly_seasonality());
        assert!(!d.daily_seasonality());
        assert_eq!(d.growth(), Growth::Linear);
        assert_eq!(d.capacity(), None);
        assert_eq!(d.n_changepoints(), 25);
        assert_eq!(d.changepoint_range(), 0.8);
    }

    #[test]
    fn test_partial_override() {
        let raw = ModelParameters {
            changepoint_prior_scale: Some(0.08),
            seasonality_mode: Some("multiplicative".into()),
            yearly_seasonality: Some(false),
            ..Default::default()
        };
        let config = ModelConfig::build(Some(&raw)).unwrap();
        assert_eq!(config.changepoint_prior_scale(), 0.08);
        assert_eq!(config.seasonality_mode(), SeasonalityMode::Multiplicative);
        assert!(!config.yearly_seasonality());
        assert_eq!(config.seasonality_prior_scale(), 10.0);
        assert_eq!(config.n_changepoints(), 25);
    }

    #[test]
    fn test_bad_enum_is_error_not_fallback() {
        let raw = ModelParameters {
            seasonality_mode: Some("Additive".into()),
            ..Default::default()
        };
        assert_eq!(
            ModelConfig::build(Some(&raw)).unwrap_err().field,
            "seasonality_mode"
        );

        let raw = ModelParameters {
            growth: Some("flat".into()),
            ..Default::default()
        };
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap_err().field, "growth");
    }

    #[test]
    fn test_scales_must_be_positive() {
        for (raw, field) in [
            (
                ModelParameters {
                    changepoint_prior_scale: Some(0.0),
                    ..Default::default()
                },
                "changepoint_prior_scale",
            ),
            (
                ModelParameters {
                    seasonality_prior_scale: Some(-1.0),
                    ..Default::default()
                },
                "seasonality_prior_scale",
            ),
            (
                ModelParameters {
                    holidays_prior_scale: Some(f64::NAN),
                    ..Default::default()
                },
                "holidays_prior_scale",
            ),
        ] {
            assert_eq!(ModelConfig::build(Some(&raw)).unwrap_err().field, field);
        }
    }

    #[test]
    fn test_changepoint_range_bounds() {
        for bad in [0.0, -0.1, 1.01] {
            let raw = ModelParameters {
                changepoint_range: Some(bad),
                ..Default::default()
            };
            assert_eq!(
                ModelConfig::build(Some(&raw)).unwrap_err().field,
                "changepoint_range"
            );
        }
        let raw = ModelParameters {
            changepoint_range: Some(1.0),
            ..Default::default()
        };
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap().changepoint_range(), 1.0);
    }

    #[test]
    fn test_negative_changepoints_rejected() {
        let raw = ModelParameters {
            n_changepoints: Some(-1),
            ..Default::default()
        };
        assert_eq!(
            ModelConfig::build(Some(&raw)).unwrap_err().field,
            "n_changepoints"
        );

        let raw = ModelParameters {
            n_changepoints: Some(0),
            ..Default::default()
        };
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap().n_changepoints(), 0);
    }

    #[test]
    fn test_logistic_requires_capacity() {
        let raw = ModelParameters {
            growth: Some("logistic".into()),
            ..Default::default()
        };
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap_err().field, "cap");

        let raw = ModelParameters {
            growth: Some("logistic".into()),
            cap: Some(10.0),
            ..Default::default()
        };
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap_err().field, "floor");
    }

    #[test]
    fn test_logistic_cap_must_exceed_floor() {
        for (cap, floor) in [(5.0, 5.0), (4.0, 5.0)] {
            let raw = ModelParameters {
                growth: Some("logistic".into()),
                cap: Some(cap),
                floor: Some(floor),
                ..Default::default()
            };
            assert_eq!(ModelConfig::build(Some(&raw)).unwrap_err().field, "cap");
        }

        let raw = ModelParameters {
            growth: Some("logistic".into()),
            cap: Some(100.0),
            floor: Some(0.0),
            ..Default::default()
        };
        let config = ModelConfig::build(Some(&raw)).unwrap();
        assert_eq!(config.growth(), Growth::Logistic);
        assert_eq!(config.capacity(), Some((100.0, 0.0)));
    }

    #[test]
    fn test_linear_growth_ignores_capacity() {
        let raw = ModelParameters {
            cap: Some(1.0),
            floor: Some(2.0),
            ..Default::default()
        };
        let config = ModelConfig::build(Some(&raw)).unwrap();
        assert_eq!(config.cap(), None);
        assert_eq!(config.floor(), None);
        assert_eq!(config, defaults());
    }

    #[test]
    fn test_parameters_from_config_rebuild_identically() {
        let raw: ModelParameters = defaults().into();
        assert_eq!(ModelConfig::build(Some(&raw)).unwrap(), defaults());
    }

    #[test]
    fn test_null_fields_deserialize_as_defaults() {
        let raw: ModelParameters =
            serde_json::from_str(r#"{"growth": null, "n_changepoints": 10}"#).unwrap();
        let config = ModelConfig::build(Some(&raw)).unwrap();
        assert_eq!(config.growth(), Growth::Linear);
        assert_eq!(config.n_changepoints(), 10);
    }

    #[test]
    fn test_defaults_serialize_fully_populated() {
        let value = serde_json::to_value(defaults()).unwrap();
        assert_eq!(value["seasonality_mode"], "additive");
        assert_eq!(value["growth"], "linear");
        assert!(value["cap"].is_null());
        assert_eq!(value["n_changepoints"], 25);
        assert_eq!(value.as_object().unwrap().len(), 12);
    }

    #[test]
    fn test_catalog_tracks_defaults() {
        let catalog = parameter_catalog();
        assert_eq!(catalog.len(), 12);
        let defaults_json = serde_json::to_value(defaults()).unwrap();
        for spec in catalog {
            assert_eq!(defaults_json[spec.name], spec.default, "{}", spec.name);
        }
    }
}
