//! The prediction pipeline: validate → vectorize → infer → inverse-transform.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::Prediction;
use crate::error::{ServiceError, Result};
use crate::ml::{InferenceAdapter, LoadedModel};
use crate::validation::validate_record;

/// Key of the optional request envelope, `{"data": {...}}`.
pub const ENVELOPE_KEY: &str = "data";

/// Stateless predictor over one loaded model.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: LoadedModel,
    adapter: InferenceAdapter,
}

impl Predictor {
    pub fn new(model: LoadedModel) -> Self {
        let adapter = InferenceAdapter::new(model.regressor.clone());
        Self { model, adapter }
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    /// Accept the bare record or the same record wrapped as `{"data": {...}}`.
    pub fn unwrap_record(body: &Value) -> Result<&Map<String, Value>> {
        let Value::Object(map) = body else {
            return Err(ServiceError::MalformedBody(
                "request body must be a JSON object".to_string(),
            ));
        };

        match map.get(ENVELOPE_KEY) {
            Some(Value::Object(inner)) if map.len() == 1 => Ok(inner),
            _ => Ok(map),
        }
    }

    pub fn predict(&self, body: &Value) -> Result<Prediction> {
        let raw = Self::unwrap_record(body)?;
        let record = validate_record(raw).map_err(|e| {
            debug!(fields = ?e.field_names(), "request rejected by validation");
            ServiceError::Validation(e)
        })?;

        let row = self.model.feature_order.vectorize(&record);
        let log_outputs = self.adapter.predict_one(row)?;

        Prediction::from_log_outputs(&log_outputs)?.ensure_encodable()
    }
}
