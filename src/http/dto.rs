//! Data Transfer Objects for the HTTP API.
//!
//! Forecast request/response types are re-exported from the api module
//! since they already derive Serialize/Deserialize.

use serde::{Deserialize, Serialize};

pub use crate::api::{
    ForecastRequest, ForecastResponse, ModelConfig, ModelParameters, ParameterSpec,
    TimeSeriesData,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Name of the forecast model in use
    pub model: String,
}
