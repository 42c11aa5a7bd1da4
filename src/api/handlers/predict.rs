use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::domain::Prediction;
use crate::error::{Result, ServiceError};

/// POST /predict
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<Prediction>> {
    state.metrics.inc_requests();

    match run_prediction(&state, &body).await {
        Ok(prediction) => {
            state.metrics.inc_successes();
            Ok(Json(prediction))
        }
        Err(e) => {
            state.metrics.record_failure(&e);
            match &e {
                ServiceError::Validation(_) | ServiceError::MalformedBody(_) => {
                    debug!(error = %e, "prediction request rejected")
                }
                _ => error!(error = %e, model = %state.model().tag(), "prediction failed"),
            }
            Err(e)
        }
    }
}

async fn run_prediction(state: &AppState, body: &[u8]) -> Result<Prediction> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ServiceError::MalformedBody(e.to_string()))?;

    // Model evaluation is CPU-bound; keep it off the async workers.
    let predictor = state.predictor.clone();
    tokio::task::spawn_blocking(move || predictor.predict(&value))
        .await
        .map_err(|e| ServiceError::Inference(format!("inference task failed: {e}")))?
}
