//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! orchestrator or the parameter catalog.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::dto::{ForecastRequest, ForecastResponse, HealthResponse, ModelConfig, ParameterSpec};
use super::error::AppError;
use super::state::AppState;
use crate::error::ValidationError;
use crate::models::{defaults, parameter_catalog};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint reporting the crate version and active model.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.orchestrator.model_name().to_string(),
    }))
}

// =============================================================================
// Forecast
// =============================================================================

/// POST /forecast
///
/// Validate the request, then fit and predict on a blocking thread under
/// the configured timeout. The model is cancelled when the request ends
/// early, whether by timeout or by the client going away.
pub async fn create_forecast(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> HandlerResult<ForecastResponse> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = ForecastRequest::from_json(body)?;

    let request_id = Uuid::new_v4();
    run_forecast(state, request)
        .instrument(info_span!("forecast", %request_id))
        .await
}

async fn run_forecast(state: AppState, request: ForecastRequest) -> HandlerResult<ForecastResponse> {
    let validated = request.validate()?;
    if validated.periods > state.settings.max_periods {
        return Err(ValidationError::new(
            "periods",
            format!(
                "must be at most {}, got {}",
                state.settings.max_periods, validated.periods
            ),
        )
        .into());
    }

    info!(
        observations = validated.series.len(),
        periods = validated.periods,
        return_components = validated.return_components,
        "forecast requested"
    );

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let orchestrator = state.orchestrator.clone();
    let task = tokio::task::spawn_blocking(move || {
        orchestrator.run_with_cancellation(
            &validated.series,
            &validated.config,
            validated.periods,
            validated.return_components,
            &cancel,
        )
    });

    let timeout = state.settings.request_timeout();
    let outcome = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| {
            warn!(?timeout, "forecast timed out");
            AppError::Timeout(format!("forecast did not finish within {:?}", timeout))
        })?
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    let result = outcome.map_err(|e| {
        warn!(kind = %e.kind(), error = %e, "forecast failed");
        AppError::from(e)
    })?;

    info!(horizon = result.horizon(), "forecast completed");
    Ok(Json(ForecastResponse::from(result)))
}

// =============================================================================
// Parameters
// =============================================================================

/// GET /parameters/default
///
/// The fully populated default model configuration.
pub async fn get_default_parameters() -> HandlerResult<ModelConfig> {
    Ok(Json(defaults()))
}

/// GET /parameters/schema
///
/// Name, type, default, constraint and description of every parameter.
pub async fn get_parameter_schema() -> HandlerResult<Vec<ParameterSpec>> {
    Ok(Json(parameter_catalog()))
}
