use std::sync::Arc;

use crate::ml::LoadedModel;
use crate::services::{Metrics, Predictor};

/// Shared application state for API handlers
///
/// Built once at startup from a loaded model; read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Prediction pipeline over the loaded model
    pub predictor: Arc<Predictor>,

    /// Request counters
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            predictor: Arc::new(Predictor::new(model)),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn model(&self) -> &LoadedModel {
        self.predictor.model()
    }

    pub fn uptime_seconds(&self) -> i64 {
        self.metrics.uptime_seconds()
    }
}
