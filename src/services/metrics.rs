use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ServiceError;

/// Request counters for the prediction endpoint
#[derive(Debug)]
pub struct Metrics {
    /// Prediction requests received
    pub requests: AtomicU64,
    /// Predictions returned
    pub successes: AtomicU64,
    /// Requests rejected by validation (including malformed bodies)
    pub validation_failures: AtomicU64,
    /// Model call or shape failures
    pub inference_failures: AtomicU64,
    /// Non-encodable predictions
    pub serialization_failures: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            serialization_failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_successes(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed request under its error class.
    pub fn record_failure(&self, err: &ServiceError) {
        let counter = match err {
            ServiceError::Validation(_) | ServiceError::MalformedBody(_) => {
                &self.validation_failures
            }
            ServiceError::Serialization(_) => &self.serialization_failures,
            _ => &self.inference_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }

    /// Prometheus text exposition.
    ///
    /// `conso_up` is constant 1: the server only binds after the model has
    /// loaded, so any process able to answer a scrape is serving.
    pub fn render(&self) -> String {
        format!(
            r#"# HELP conso_up Model loaded and serving (always 1 while scrapeable)
# TYPE conso_up gauge
conso_up 1

# HELP conso_uptime_seconds Uptime in seconds
# TYPE conso_uptime_seconds counter
conso_uptime_seconds {}

# HELP conso_predict_requests_total Prediction requests received
# TYPE conso_predict_requests_total counter
conso_predict_requests_total {}

# HELP conso_predict_success_total Predictions returned
# TYPE conso_predict_success_total counter
conso_predict_success_total {}

# HELP conso_predict_validation_failures_total Requests rejected by validation
# TYPE conso_predict_validation_failures_total counter
conso_predict_validation_failures_total {}

# HELP conso_predict_inference_failures_total Model inference failures
# TYPE conso_predict_inference_failures_total counter
conso_predict_inference_failures_total {}

# HELP conso_predict_serialization_failures_total Predictions that could not be encoded
# TYPE conso_predict_serialization_failures_total counter
conso_predict_serialization_failures_total {}
"#,
            self.uptime_seconds(),
            self.requests.load(Ordering::Relaxed),
            self.successes.load(Ordering::Relaxed),
            self.validation_failures.load(Ordering::Relaxed),
            self.inference_failures.load(Ordering::Relaxed),
            self.serialization_failures.load(Ordering::Relaxed),
        )
    }
}
