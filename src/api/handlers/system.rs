use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};

use crate::api::{
    state::AppState,
    types::{HealthResponse, MetadataResponse},
};

/// GET /healthz -- liveness
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /readyz -- the model is loaded before the listener binds, so a
/// responding process is ready.
pub async fn readiness_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model().tag(),
        started_at: state.metrics.started_at(),
        uptime_secs: state.uptime_seconds(),
    })
}

/// GET /metadata
pub async fn get_metadata(State(state): State<AppState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        model: state.model().info.clone(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics -- Prometheus text format
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
}
