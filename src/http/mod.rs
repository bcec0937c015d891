//! HTTP server module for the forecast service.
//!
//! This module provides an axum-based HTTP server that exposes the
//! orchestrator as a REST API. It reuses the validation, orchestration and
//! DTO types from the core library.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Request parsing and validation                         │
//! │  - JSON serialization/deserialization                     │
//! │  - CORS, compression, timeouts, error mapping             │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Orchestrator (services/orchestrator.rs)                  │
//! │  - Fit, predict, slice to horizon, assemble               │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Forecast model (services/engine.rs seam)                 │
//! │  - DecomposableModel or any ForecastModel                 │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
