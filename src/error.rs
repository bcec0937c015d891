//! Error types for forecast requests.
//!
//! Three failure families cross the request boundary: malformed input
//! ([`ValidationError`]), a model that could not be fit, and a fitted model
//! that could not predict. The last two wrap the [`ModelError`] reported by
//! the forecasting capability.

use std::fmt;

/// Result type for forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Malformed or inconsistent input, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for '{field}': {reason}")]
pub struct ValidationError {
    /// Name of the field that failed validation (e.g. "dates", "cap")
    pub field: String,
    /// Human-readable description of the violated rule
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a forecasting model implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Linear algebra or floating point breakdown while fitting or predicting.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// Iterative estimation did not converge.
    #[error("did not converge: {0}")]
    NonConvergence(String),

    /// The requested horizon cannot be produced from the fitted state.
    #[error("unsupported horizon of {periods} periods: {reason}")]
    UnsupportedHorizon { periods: usize, reason: String },

    /// The model rejected its input (should not happen for validated input).
    #[error("invalid model input: {0}")]
    InvalidInput(String),

    /// The caller abandoned the request; names the stage that noticed.
    #[error("cancelled during {0}")]
    Cancelled(String),
}

/// Discriminator for [`ForecastError`], useful for callers mapping errors
/// onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastErrorKind {
    Validation,
    ModelFitFailed,
    ModelPredictFailed,
}

impl fmt::Display for ForecastErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForecastErrorKind::Validation => "validation",
            ForecastErrorKind::ModelFitFailed => "model_fit_failed",
            ForecastErrorKind::ModelPredictFailed => "model_predict_failed",
        };
        f.write_str(name)
    }
}

/// Error returned by a forecast run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    /// Input was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model could not be fit to valid input.
    #[error("model fit failed: {0}")]
    ModelFitFailed(ModelError),

    /// Fitting succeeded but prediction failed.
    #[error("model prediction failed: {0}")]
    ModelPredictFailed(ModelError),
}

impl ForecastError {
    pub fn kind(&self) -> ForecastErrorKind {
        match self {
            ForecastError::Validation(_) => ForecastErrorKind::Validation,
            ForecastError::ModelFitFailed(_) => ForecastErrorKind::ModelFitFailed,
            ForecastError::ModelPredictFailed(_) => ForecastErrorKind::ModelPredictFailed,
        }
    }

    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::Validation(ValidationError::new(field, reason))
    }

    /// Create a predict failure from a structural problem in the raw prediction.
    pub(crate) fn malformed_prediction(reason: impl Into<String>) -> Self {
        ForecastError::ModelPredictFailed(ModelError::InvalidInput(reason.into()))
    }
}
