//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS; the service sits behind a gateway in deployment
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let parameters = Router::new()
        .route("/default", get(handlers::get_default_parameters))
        .route("/schema", get(handlers::get_parameter_schema));

    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/forecast", post(handlers::create_forecast))
        .route("/forecast/", post(handlers::create_forecast))
        .nest("/parameters", parameters)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
