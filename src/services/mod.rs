//! Service layer for forecast orchestration.
//!
//! The orchestrator sits between request validation and a forecasting
//! model. Models plug in through the [`engine`] traits; the crate ships
//! one built-in model in [`decomposition`].

pub mod decomposition;
pub mod engine;

pub mod linalg;

pub mod orchestrator;

pub use decomposition::{DecomposableModel, DEFAULT_INTERVAL_WIDTH};
pub use engine::{checkpoint, FittedModel, ForecastModel, RawPrediction};
pub use orchestrator::ForecastOrchestrator;
