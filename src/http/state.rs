//! Application state for the HTTP server.

use crate::config::{ForecastSettings, ServiceConfig};
use crate::services::ForecastOrchestrator;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator wrapping the configured forecast model
    pub orchestrator: ForecastOrchestrator,
    /// Per-request limits
    pub settings: ForecastSettings,
    /// Largest accepted request body
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Create a new application state from an orchestrator and configuration.
    pub fn new(orchestrator: ForecastOrchestrator, config: &ServiceConfig) -> Self {
        Self {
            orchestrator,
            settings: config.forecast,
            body_limit_bytes: config.server.body_limit_bytes,
        }
    }
}
