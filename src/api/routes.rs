use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Prediction endpoint
        .route("/predict", post(handlers::predict))
        // Model endpoints
        .route("/metadata", get(handlers::get_metadata))
        // Probes and metrics
        .route("/healthz", get(handlers::liveness_handler))
        .route("/readyz", get(handlers::readiness_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
        // Requests past the budget are answered with 408
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
