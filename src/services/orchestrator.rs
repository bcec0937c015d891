//! Forecast orchestration: fit, predict, slice to the horizon, assemble.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::engine::{ForecastModel, RawPrediction};
use crate::error::{ForecastError, Result};
use crate::models::{ComponentMap, ForecastResult, ModelConfig, TimeSeries};

/// Runs a [`ForecastModel`] and turns its raw output into a [`ForecastResult`].
///
/// The orchestrator holds no per-request state. Cloning it shares the
/// underlying model.
#[derive(Clone)]
pub struct ForecastOrchestrator {
    model: Arc<dyn ForecastModel>,
}

impl ForecastOrchestrator {
    pub fn new(model: Arc<dyn ForecastModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Forecast `periods` steps past the end of `series`.
    ///
    /// `series` and `config` are expected to be validated already; only the
    /// horizon and the shape of the model output are checked here. Fit and
    /// predict failures are reported as distinct error kinds and are never
    /// retried.
    ///
    /// The returned dates start one step after the last observation, using
    /// the step inferred from the series. `components` is present iff
    /// `return_components` is set.
    pub fn run(
        &self,
        series: &TimeSeries,
        config: &ModelConfig,
        periods: usize,
        return_components: bool,
    ) -> Result<ForecastResult> {
        self.run_with_cancellation(
            series,
            config,
            periods,
            return_components,
            &CancellationToken::new(),
        )
    }

    /// [`run`](Self::run), abandoning fit and predict once `cancel` fires.
    ///
    /// A cancelled run fails with the kind of the step that was in flight.
    pub fn run_with_cancellation(
        &self,
        series: &TimeSeries,
        config: &ModelConfig,
        periods: usize,
        return_components: bool,
        cancel: &CancellationToken,
    ) -> Result<ForecastResult> {
        if periods == 0 {
            return Err(ForecastError::validation("periods", "must be at least 1"));
        }

        let forecast_dates = series.future_dates(periods).ok_or_else(|| {
            ForecastError::validation(
                "periods",
                format!(
                    "a horizon of {} steps runs past the supported calendar range",
                    periods
                ),
            )
        })?;

        let started = Instant::now();
        let fitted = self
            .model
            .fit(series, config, cancel)
            .map_err(ForecastError::ModelFitFailed)?;
        debug!(
            "{} fitted {} observations in {:?}",
            self.model.name(),
            series.len(),
            started.elapsed()
        );

        let started = Instant::now();
        let raw = fitted
            .predict(periods, cancel)
            .map_err(ForecastError::ModelPredictFailed)?;
        debug!(
            "{} predicted {} timeline points in {:?}",
            self.model.name(),
            raw.len(),
            started.elapsed()
        );

        if raw.len() != series.len() + periods {
            debug!(
                "raw prediction has {} points, expected history {} + horizon {}",
                raw.len(),
                series.len(),
                periods
            );
        }

        let horizon = HorizonWindow::new(&raw, periods)?;
        let values = horizon.slice(&raw.yhat);
        let (lower, upper) = normalize_bounds(
            values,
            horizon.slice(&raw.yhat_lower),
            horizon.slice(&raw.yhat_upper),
        );

        let components = if return_components {
            Some(horizon.components(&raw.components)?)
        } else {
            None
        };

        ForecastResult::assemble(forecast_dates, values.to_vec(), lower, upper, components)
    }
}

/// The trailing `periods` entries of a raw prediction.
struct HorizonWindow {
    start: usize,
    timeline: usize,
}

impl HorizonWindow {
    fn new(raw: &RawPrediction, periods: usize) -> Result<Self> {
        let timeline = raw.yhat.len();
        if raw.yhat_lower.len() != timeline || raw.yhat_upper.len() != timeline {
            return Err(ForecastError::malformed_prediction(format!(
                "bounds have {} and {} points for {} predictions",
                raw.yhat_lower.len(),
                raw.yhat_upper.len(),
                timeline
            )));
        }
        if timeline < periods {
            return Err(ForecastError::malformed_prediction(format!(
                "{} predicted points cannot cover a horizon of {}",
                timeline, periods
            )));
        }

        let window = Self {
            start: timeline - periods,
            timeline,
        };
        for (name, series) in [
            ("yhat", &raw.yhat),
            ("yhat_lower", &raw.yhat_lower),
            ("yhat_upper", &raw.yhat_upper),
        ] {
            window.check_finite(name, series)?;
        }
        Ok(window)
    }

    fn slice<'a>(&self, series: &'a [f64]) -> &'a [f64] {
        &series[self.start..]
    }

    fn check_finite(&self, name: &str, series: &[f64]) -> Result<()> {
        match self.slice(series).iter().position(|v| !v.is_finite()) {
            Some(i) => Err(ForecastError::malformed_prediction(format!(
                "{} is not finite at horizon step {}",
                name, i
            ))),
            None => Ok(()),
        }
    }

    /// Slice every component the model produced; absent ones stay absent.
    fn components(&self, produced: &ComponentMap) -> Result<ComponentMap> {
        let mut out = ComponentMap::new();
        for (name, series) in produced {
            if series.len() != self.timeline {
                return Err(ForecastError::malformed_prediction(format!(
                    "component '{}' has {} points for a timeline of {}",
                    name,
                    series.len(),
                    self.timeline
                )));
            }
            self.check_finite(name, series)?;
            out.insert(name.clone(), self.slice(series).to_vec());
        }
        Ok(out)
    }
}

/// Widen crossed bounds to the point forecast so `lower <= value <= upper`.
fn normalize_bounds(values: &[f64], lower: &[f64], upper: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut adjusted = 0usize;
    let (lower, upper): (Vec<f64>, Vec<f64>) = values
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&v, (&lo, &hi))| {
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if lo > v || hi < v {
                adjusted += 1;
            }
            (lo.min(v), hi.max(v))
        })
        .unzip();

    if adjusted > 0 {
        warn!(
            "widened {} forecast bound pairs that did not contain the point forecast",
            adjusted
        );
    }
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ForecastErrorKind, ModelError};
    use crate::models::{defaults, format_date};
    use crate::services::engine::FittedModel;

    /// Echoes a fixed prediction, or fails on request.
    struct FixedModel {
        fail_fit: bool,
        prediction: std::result::Result<RawPrediction, ModelError>,
    }

    struct FixedFit(std::result::Result<RawPrediction, ModelError>);

    impl FittedModel for FixedFit {
        fn predict(
            &self,
            _periods: usize,
            cancel: &CancellationToken,
        ) -> std::result::Result<RawPrediction, ModelError> {
            crate::services::checkpoint(cancel, "predict")?;
            self.0.clone()
        }
    }

    impl ForecastModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fit(
            &self,
            _series: &TimeSeries,
            _config: &ModelConfig,
            _cancel: &CancellationToken,
        ) -> std::result::Result<Box<dyn FittedModel>, ModelError> {
            if self.fail_fit {
                return Err(ModelError::NonConvergence("stub".into()));
            }
            Ok(Box::new(FixedFit(self.prediction.clone())))
        }
    }

    fn orchestrator(prediction: std::result::Result<RawPrediction, ModelError>) -> ForecastOrchestrator {
        ForecastOrchestrator::new(Arc::new(FixedModel {
            fail_fit: false,
            prediction,
        }))
    }

    fn series() -> TimeSeries {
        TimeSeries::build(&["2024-01-01", "2024-01-02", "2024-01-03"], &[1.0, 2.0, 3.0]).unwrap()
    }

    fn raw(n: usize) -> RawPrediction {
        let yhat: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut components = ComponentMap::new();
        components.insert("trend".into(), yhat.clone());
        RawPrediction {
            yhat_lower: yhat.iter().map(|v| v - 1.0).collect(),
            yhat_upper: yhat.iter().map(|v| v + 1.0).collect(),
            yhat,
            components,
        }
    }

    #[test]
    fn test_slices_horizon_and_dates() {
        let result = orchestrator(Ok(raw(5)))
            .run(&series(), &defaults(), 2, false)
            .unwrap();
        assert_eq!(result.forecast_values(), &[3.0, 4.0]);
        assert_eq!(result.forecast_lower_bound(), &[2.0, 3.0]);
        assert_eq!(result.forecast_upper_bound(), &[4.0, 5.0]);
        let dates: Vec<String> = result.forecast_dates().iter().map(|d| format_date(*d)).collect();
        assert_eq!(dates, vec!["2024-01-04", "2024-01-05"]);
        assert!(result.components().is_none());
    }

    #[test]
    fn test_components_sliced_when_requested() {
        let result = orchestrator(Ok(raw(5)))
            .run(&series(), &defaults(), 2, true)
            .unwrap();
        let components = result.components().unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components["trend"], vec![3.0, 4.0]);
    }

    #[test]
    fn test_requested_components_present_even_if_none_produced() {
        let mut prediction = raw(5);
        prediction.components.clear();
        let result = orchestrator(Ok(prediction))
            .run(&series(), &defaults(), 2, true)
            .unwrap();
        assert_eq!(result.components().map(|c| c.is_empty()), Some(true));
    }

    #[test]
    fn test_zero_periods_is_validation_error() {
        let err = orchestrator(Ok(raw(3)))
            .run(&series(), &defaults(), 0, false)
            .unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::Validation);
    }

    #[test]
    fn test_fit_failure_kind() {
        let orchestrator = ForecastOrchestrator::new(Arc::new(FixedModel {
            fail_fit: true,
            prediction: Ok(raw(5)),
        }));
        let err = orchestrator.run(&series(), &defaults(), 2, false).unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::ModelFitFailed);
    }

    #[test]
    fn test_predict_failure_kind() {
        let err = orchestrator(Err(ModelError::UnsupportedHorizon {
            periods: 2,
            reason: "stub".into(),
        }))
        .run(&series(), &defaults(), 2, false)
        .unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::ModelPredictFailed);
    }

    #[test]
    fn test_short_prediction_is_predict_failure() {
        let err = orchestrator(Ok(raw(1)))
            .run(&series(), &defaults(), 2, false)
            .unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::ModelPredictFailed);
    }

    #[test]
    fn test_misaligned_component_is_predict_failure() {
        let mut prediction = raw(5);
        prediction.components.insert("weekly".into(), vec![0.0; 4]);
        let err = orchestrator(Ok(prediction))
            .run(&series(), &defaults(), 2, true)
            .unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::ModelPredictFailed);
    }

    #[test]
    fn test_non_finite_prediction_is_predict_failure() {
        let mut prediction = raw(5);
        prediction.yhat[4] = f64::NAN;
        let err = orchestrator(Ok(prediction))
            .run(&series(), &defaults(), 2, false)
            .unwrap_err();
        assert_eq!(err.kind(), ForecastErrorKind::ModelPredictFailed);
    }

    #[test]
    fn test_cancelled_run_stops_before_predict() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = orchestrator(Ok(raw(5)))
            .run_with_cancellation(&series(), &defaults(), 2, false, &cancel)
            .unwrap_err();
        assert_eq!(
            err,
            ForecastError::ModelPredictFailed(ModelError::Cancelled("predict".into()))
        );
    }

    #[test]
    fn test_crossed_bounds_are_widened() {
        let mut prediction = raw(5);
        prediction.yhat_lower[4] = 10.0;
        prediction.yhat_upper[3] = 0.0;
        let result = orchestrator(Ok(prediction))
            .run(&series(), &defaults(), 2, false)
            .unwrap();
        for i in 0..2 {
            assert!(result.forecast_lower_bound()[i] <= result.forecast_values()[i]);
            assert!(result.forecast_values()[i] <= result.forecast_upper_bound()[i]);
        }
        assert_eq!(result.forecast_upper_bound()[1], 10.0);
    }
}
