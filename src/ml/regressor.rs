//! The seam between the HTTP handler and whatever runs the model.

use std::sync::Arc;

use crate::error::{ServiceError, Result};

/// A fitted multi-output regressor.
///
/// Implementations are immutable after load and shared across requests.
#[cfg_attr(test, mockall::automock)]
pub trait Regressor: Send + Sync {
    /// Width of one input row.
    fn input_dim(&self) -> usize;

    /// Width of one output row.
    fn output_dim(&self) -> usize;

    /// Predict a batch of rows. Output has one row per input row.
    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

/// Single-row inference with shape checks on both sides of the model call.
#[derive(Clone)]
pub struct InferenceAdapter {
    model: Arc<dyn Regressor>,
}

impl std::fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("input_dim", &self.model.input_dim())
            .field("output_dim", &self.model.output_dim())
            .finish()
    }
}

impl InferenceAdapter {
    pub fn new(model: Arc<dyn Regressor>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<dyn Regressor> {
        &self.model
    }

    pub fn predict_one(&self, row: Vec<f64>) -> Result<Vec<f64>> {
        let expected = self.model.input_dim();
        if row.len() != expected {
            return Err(ServiceError::Inference(format!(
                "input dim mismatch: got {}, expected {expected}",
                row.len()
            )));
        }

        let mut out = self.model.predict(&[row])?;
        if out.len() != 1 {
            return Err(ServiceError::Inference(format!(
                "model returned {} rows for a single-row batch",
                out.len()
            )));
        }
        Ok(out.remove(0))
    }
}
