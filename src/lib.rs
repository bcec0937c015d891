//! # Forecast Service
//!
//! Time-series forecasting behind a small, strongly validated contract.
//!
//! A caller supplies dated observations, optional model parameter overrides
//! and a horizon. The crate validates the input, fits a forecasting model,
//! predicts the horizon and returns point forecasts with uncertainty bounds
//! and, on request, the additive or multiplicative components.
//!
//! ## Architecture
//!
//! - [`models`]: validated domain values (`TimeSeries`, `ModelConfig`,
//!   `ForecastResult`) and date-step inference
//! - [`services`]: the model seam, the orchestrator and the built-in
//!   decomposable model
//! - [`api`]: request/response wire types
//! - [`config`]: server configuration (TOML file + environment)
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use forecast_service::models::{defaults, TimeSeries};
//! use forecast_service::services::{DecomposableModel, ForecastOrchestrator};
//!
//! let dates: Vec<String> = (1..=28).map(|d| format!("2024-02-{:02}", d)).collect();
//! let values: Vec<f64> = (0..28).map(|i| 10.0 + i as f64).collect();
//! let series = TimeSeries::build(&dates, &values).unwrap();
//!
//! let orchestrator = ForecastOrchestrator::new(Arc::new(DecomposableModel::new()));
//! let result = orchestrator.run(&series, &defaults(), 7, false).unwrap();
//! assert_eq!(result.forecast_date_strings()[0], "2024-02-29");
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ForecastError, ForecastErrorKind, ModelError, ValidationError};
