//! The forecasting capability seam.
//!
//! A model is a pair of steps: [`ForecastModel::fit`] turns a series and a
//! configuration into a [`FittedModel`] value, and [`FittedModel::predict`]
//! produces a [`RawPrediction`] over the whole timeline. Neither step holds
//! state between requests, so one `ForecastModel` can serve concurrent
//! forecasts and tests can substitute a deterministic stub.
//!
//! Both steps receive a [`CancellationToken`]. Long-running models should
//! call [`checkpoint`] between stages so an abandoned request stops
//! consuming CPU.

use tokio_util::sync::CancellationToken;

use crate::error::ModelError;
use crate::models::{ComponentMap, ModelConfig, TimeSeries};

/// Unprocessed model output covering the fitted history followed by the
/// forecast horizon.
///
/// `yhat`, `yhat_lower`, `yhat_upper` and every component series share one
/// length. Components hold only what the model actually produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPrediction {
    pub yhat: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
    pub components: ComponentMap,
}

impl RawPrediction {
    /// Timeline length, taken from the point predictions.
    pub fn len(&self) -> usize {
        self.yhat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yhat.is_empty()
    }
}

/// A forecasting algorithm.
pub trait ForecastModel: Send + Sync {
    /// Short identifier reported by the health endpoint.
    fn name(&self) -> &str;

    /// Fit the model to a validated series.
    fn fit(
        &self,
        series: &TimeSeries,
        config: &ModelConfig,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn FittedModel>, ModelError>;
}

/// The outcome of a successful fit.
pub trait FittedModel: Send {
    /// Predict the history plus `periods` future steps, in timeline order.
    fn predict(
        &self,
        periods: usize,
        cancel: &CancellationToken,
    ) -> Result<RawPrediction, ModelError>;
}

/// Fail with [`ModelError::Cancelled`] once `cancel` has fired.
pub fn checkpoint(cancel: &CancellationToken, stage: &str) -> Result<(), ModelError> {
    if cancel.is_cancelled() {
        return Err(ModelError::Cancelled(stage.to_string()));
    }
    Ok(())
}
