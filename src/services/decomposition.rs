//! Built-in decomposable forecasting model.
//!
//! The series is split into a piecewise trend and Fourier seasonal terms:
//!
//! ```text
//! additive:        y(t) = trend(t) + Σ seasonal_k(t)
//! multiplicative:  y(t) = trend(t) * (1 + Σ seasonal_k(t))
//! ```
//!
//! The trend is piecewise linear with ridge-penalized slope changes at
//! changepoints spread over the early part of the history. Logistic growth
//! fits the same piecewise trend in logit space between `floor` and `cap`.
//! Seasonal terms are fit on what the trend leaves over. Prediction
//! intervals come from the residual spread and widen with the horizon.

use chrono::NaiveDate;
use log::debug;
use tokio_util::sync::CancellationToken;

use super::engine::{checkpoint, FittedModel, ForecastModel, RawPrediction};
use super::linalg::{apply, penalized_least_squares, quantile_normal};
use crate::error::{ModelError, ValidationError};
use crate::models::{ComponentMap, Granularity, Growth, ModelConfig, SeasonalityMode, TimeSeries};

/// Default coverage of the prediction interval.
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// Penalty on the unregularized terms (offset and base slope).
const BASE_PENALTY: f64 = 1e-8;

/// Clamp for saturation ratios before the logit transform.
const LOGIT_EPS: f64 = 1e-6;

/// Below this magnitude a trend value cannot scale multiplicative seasonality.
const MIN_TREND_MAGNITUDE: f64 = 1e-10;

/// A Fourier seasonal term.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SeasonalTerm {
    name: &'static str,
    period_days: f64,
    order: usize,
}

const YEARLY: SeasonalTerm = SeasonalTerm {
    name: "yearly",
    period_days: 365.25,
    order: 10,
};

const WEEKLY: SeasonalTerm = SeasonalTerm {
    name: "weekly",
    period_days: 7.0,
    order: 3,
};

const DAILY: SeasonalTerm = SeasonalTerm {
    name: "daily",
    period_days: 1.0,
    order: 4,
};

impl SeasonalTerm {
    /// Cosine and sine columns for every harmonic, evaluated at `days`.
    fn columns(&self, days: &[f64]) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(2 * self.order);
        for k in 1..=self.order {
            let freq = 2.0 * std::f64::consts::PI * k as f64 / self.period_days;
            columns.push(days.iter().map(|t| (freq * t).cos()).collect());
            columns.push(days.iter().map(|t| (freq * t).sin()).collect());
        }
        columns
    }
}

fn enabled_terms(config: &ModelConfig) -> Vec<SeasonalTerm> {
    [
        (config.yearly_seasonality(), YEARLY),
        (config.weekly_seasonality(), WEEKLY),
        (config.daily_seasonality(), DAILY),
    ]
    .into_iter()
    .filter_map(|(enabled, term)| enabled.then_some(term))
    .collect()
}

/// Trend + seasonality decomposition with residual-based intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposableModel {
    interval_width: f64,
}

impl DecomposableModel {
    pub fn new() -> Self {
        Self {
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }

    /// Use a prediction interval covering `width` of the predictive mass.
    pub fn with_interval_width(width: f64) -> Result<Self, ValidationError> {
        if !(width.is_finite() && width > 0.0 && width < 1.0) {
            return Err(ValidationError::new(
                "interval_width",
                format!("must be in (0, 1), got {}", width),
            ));
        }
        Ok(Self {
            interval_width: width,
        })
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

impl Default for DecomposableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for DecomposableModel {
    fn name(&self) -> &str {
        "decomposable"
    }

    fn fit(
        &self,
        series: &TimeSeries,
        config: &ModelConfig,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn FittedModel>, ModelError> {
        let fit = DecomposedFit::estimate(series, config, self.interval_width, cancel)?;
        Ok(Box::new(fit))
    }
}

/// Piecewise linear trend in scaled time.
#[derive(Debug, Clone)]
struct PiecewiseTrend {
    /// Changepoint locations in scaled time.
    changepoints: Vec<f64>,
    /// Offset, base slope, then one slope delta per changepoint.
    coefficients: Vec<f64>,
}

impl PiecewiseTrend {
    fn columns(changepoints: &[f64], t: &[f64]) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(2 + changepoints.len());
        columns.push(vec![1.0; t.len()]);
        columns.push(t.to_vec());
        for &s in changepoints {
            columns.push(t.iter().map(|&x| (x - s).max(0.0)).collect());
        }
        columns
    }

    fn fit(
        t: &[f64],
        target: &[f64],
        changepoints: Vec<f64>,
        prior_scale: f64,
    ) -> Result<Self, ModelError> {
        let columns = Self::columns(&changepoints, t);
        let delta_penalty = 1.0 / (prior_scale * prior_scale);
        let mut penalties = vec![BASE_PENALTY, BASE_PENALTY];
        penalties.resize(columns.len(), delta_penalty);
        let coefficients = penalized_least_squares(&columns, target, &penalties)?;
        Ok(Self {
            changepoints,
            coefficients,
        })
    }

    fn evaluate(&self, t: &[f64]) -> Vec<f64> {
        apply(&Self::columns(&self.changepoints, t), &self.coefficients, t.len())
    }
}

/// Changepoint locations: `n_changepoints` evenly spaced observation times
/// within the first `changepoint_range` of the history, excluding the first.
fn changepoint_locations(t: &[f64], n_changepoints: u32, changepoint_range: f64) -> Vec<f64> {
    let hist_size = ((t.len() as f64) * changepoint_range).floor() as usize;
    let n = (n_changepoints as usize).min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| {
            let idx = (last * i as f64 / n as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect()
}

/// Fitted state of a [`DecomposableModel`].
#[derive(Debug, Clone)]
struct DecomposedFit {
    growth: Growth,
    mode: SeasonalityMode,
    capacity: Option<(f64, f64)>,
    origin: NaiveDate,
    history_dates: Vec<NaiveDate>,
    granularity: Granularity,
    history_days: Vec<f64>,
    span_days: f64,
    y_scale: f64,
    trend: PiecewiseTrend,
    seasonal: Vec<(SeasonalTerm, Vec<f64>)>,
    sigma: f64,
    z: f64,
}

impl DecomposedFit {
    fn estimate(
        series: &TimeSeries,
        config: &ModelConfig,
        interval_width: f64,
        cancel: &CancellationToken,
    ) -> Result<Self, ModelError> {
        let n = series.len();
        let y = series.values();
        let origin = series.first_date();
        let history_days: Vec<f64> = series
            .dates()
            .iter()
            .map(|d| (*d - origin).num_days() as f64)
            .collect();
        let span_days = history_days[n - 1];
        if span_days <= 0.0 {
            return Err(ModelError::InvalidInput(
                "history must span more than one date".to_string(),
            ));
        }
        let t: Vec<f64> = history_days.iter().map(|d| d / span_days).collect();

        let y_scale = match y.iter().fold(0.0_f64, |m, v| m.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };

        let capacity = match config.growth() {
            Growth::Linear => None,
            Growth::Logistic => Some(config.capacity().ok_or_else(|| {
                ModelError::InvalidInput("logistic growth without cap and floor".to_string())
            })?),
        };

        let trend_target: Vec<f64> = match capacity {
            None => y.iter().map(|v| v / y_scale).collect(),
            Some((cap, floor)) => y
                .iter()
                .map(|v| {
                    let p = ((v - floor) / (cap - floor)).clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
                    (p / (1.0 - p)).ln()
                })
                .collect(),
        };

        checkpoint(cancel, "trend")?;
        let changepoints =
            changepoint_locations(&t, config.n_changepoints(), config.changepoint_range());
        let trend = PiecewiseTrend::fit(
            &t,
            &trend_target,
            changepoints,
            config.changepoint_prior_scale(),
        )?;

        let mut fit = Self {
            growth: config.growth(),
            mode: config.seasonality_mode(),
            capacity,
            origin,
            history_dates: series.dates().to_vec(),
            granularity: series.granularity(),
            history_days,
            span_days,
            y_scale,
            trend,
            seasonal: Vec::new(),
            sigma: 0.0,
            z: quantile_normal(0.5 + interval_width / 2.0),
        };

        let trend_hist = fit.trend_values(&t);
        let seasonal_target: Vec<f64> = match fit.mode {
            SeasonalityMode::Additive => y
                .iter()
                .zip(&trend_hist)
                .map(|(v, tr)| (v - tr) / y_scale)
                .collect(),
            SeasonalityMode::Multiplicative => {
                if trend_hist.iter().any(|tr| tr.abs() < MIN_TREND_MAGNITUDE) {
                    return Err(ModelError::Numerical(
                        "trend reaches zero; multiplicative seasonality is undefined".to_string(),
                    ));
                }
                y.iter().zip(&trend_hist).map(|(v, tr)| v / tr - 1.0).collect()
            }
        };

        checkpoint(cancel, "seasonality")?;
        let terms = enabled_terms(config);
        if !terms.is_empty() {
            let mut columns = Vec::new();
            for term in &terms {
                columns.extend(term.columns(&fit.history_days));
            }
            let penalty = 1.0 / config.seasonality_prior_scale().powi(2);
            let coefficients =
                penalized_least_squares(&columns, &seasonal_target, &vec![penalty; columns.len()])?;

            let mut offset = 0;
            for term in terms {
                let width = 2 * term.order;
                fit.seasonal
                    .push((term, coefficients[offset..offset + width].to_vec()));
                offset += width;
            }
        }

        checkpoint(cancel, "residuals")?;
        let days = fit.history_days.clone();
        let (fitted, _) = fit.evaluate(&days);
        let sse: f64 = y.iter().zip(&fitted).map(|(a, b)| (a - b).powi(2)).sum();
        fit.sigma = (sse / (n.saturating_sub(1).max(1)) as f64).sqrt();
        if !fit.sigma.is_finite() {
            return Err(ModelError::Numerical(
                "residual spread is not finite".to_string(),
            ));
        }

        debug!(
            "decomposed fit: growth={} mode={} changepoints={} seasonal_terms={} sigma={:.4}",
            fit.growth,
            fit.mode,
            fit.trend.changepoints.len(),
            fit.seasonal.len(),
            fit.sigma
        );
        Ok(fit)
    }

    /// Trend in original units at scaled times `t`.
    fn trend_values(&self, t: &[f64]) -> Vec<f64> {
        let raw = self.trend.evaluate(t);
        match self.capacity {
            None => raw.iter().map(|v| v * self.y_scale).collect(),
            Some((cap, floor)) => raw
                .iter()
                .map(|v| floor + (cap - floor) / (1.0 + (-v).exp()))
                .collect(),
        }
    }

    /// Point predictions and named components at `days` since the origin.
    fn evaluate(&self, days: &[f64]) -> (Vec<f64>, ComponentMap) {
        let t: Vec<f64> = days.iter().map(|d| d / self.span_days).collect();
        let trend = self.trend_values(&t);

        let mut components = ComponentMap::new();
        let mut seasonal_total = vec![0.0; days.len()];
        for (term, coefficients) in &self.seasonal {
            let mut effect = apply(&term.columns(days), coefficients, days.len());
            if self.mode == SeasonalityMode::Additive {
                effect.iter_mut().for_each(|v| *v *= self.y_scale);
            }
            for (total, v) in seasonal_total.iter_mut().zip(&effect) {
                *total += v;
            }
            components.insert(term.name.to_string(), effect);
        }

        let yhat = trend
            .iter()
            .zip(&seasonal_total)
            .map(|(tr, s)| match self.mode {
                SeasonalityMode::Additive => tr + s,
                SeasonalityMode::Multiplicative => tr * (1.0 + s),
            })
            .collect();
        components.insert("trend".to_string(), trend);
        (yhat, components)
    }
}

impl FittedModel for DecomposedFit {
    fn predict(
        &self,
        periods: usize,
        cancel: &CancellationToken,
    ) -> Result<RawPrediction, ModelError> {
        checkpoint(cancel, "predict")?;
        let future = self
            .granularity
            .continue_from(&self.history_dates, periods)
            .ok_or_else(|| ModelError::UnsupportedHorizon {
                periods,
                reason: "dates run past the supported calendar range".to_string(),
            })?;

        let n = self.history_days.len();
        let mut days = self.history_days.clone();
        days.extend(future.iter().map(|d| (*d - self.origin).num_days() as f64));

        let (yhat, components) = self.evaluate(&days);

        let half_widths: Vec<f64> = (0..days.len())
            .map(|i| {
                let steps_ahead = i.saturating_sub(n - 1) as f64;
                self.z * self.sigma * (1.0 + steps_ahead / n as f64).sqrt()
            })
            .collect();

        Ok(RawPrediction {
            yhat_lower: yhat.iter().zip(&half_widths).map(|(v, h)| v - h).collect(),
            yhat_upper: yhat.iter().zip(&half_widths).map(|(v, h)| v + h).collect(),
            yhat,
            components,
        })
    }
}
