//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ValidationError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Body could not be decoded into a request
    BadRequest(String),
    /// Request decoded but failed validation
    Validation(ValidationError),
    /// Model could not be fit
    ModelFitFailed(String),
    /// Fitted model could not predict
    ModelPredictFailed(String),
    /// Forecast did not finish within the configured timeout
    Timeout(String),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("BAD_REQUEST", msg),
            ),
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", e.to_string()).with_details(e.field),
            ),
            AppError::ModelFitFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("MODEL_FIT_FAILED", msg),
            ),
            AppError::ModelPredictFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("MODEL_PREDICT_FAILED", msg),
            ),
            AppError::Timeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiError::new("TIMEOUT", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let message = err.to_string();
        match err {
            ForecastError::Validation(e) => AppError::Validation(e),
            ForecastError::ModelFitFailed(_) => AppError::ModelFitFailed(message),
            ForecastError::ModelPredictFailed(_) => AppError::ModelPredictFailed(message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
