//! ONNX regressor (pure Rust via `tract-onnx`).
//!
//! For models exported from other toolchains (e.g. a scikit-learn pipeline
//! converted to ONNX). The graph is specialized to a `[1, input_dim]` f32 input.

use std::path::Path;

use tract_onnx::prelude::*;

use crate::error::{ServiceError, Result};
use crate::ml::regressor::Regressor;

pub struct OnnxRegressor {
    plan: TypedRunnableModel<TypedModel>,
    input_dim: usize,
    output_dim: usize,
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("input_dim", &self.input_dim)
            .field("output_dim", &self.output_dim)
            .finish()
    }
}

fn load_err(stage: &str, e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Registry(format!("onnx {stage} failed: {e}"))
}

fn run_err(stage: &str, e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Inference(format!("onnx {stage} failed: {e}"))
}

impl OnnxRegressor {
    pub fn load<P: AsRef<Path>>(path: P, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(ServiceError::Registry("input_dim must be > 0".to_string()));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path.as_ref())
            .map_err(|e| load_err("load", e))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)))
            .map_err(|e| load_err("input fact", e))?
            .into_optimized()
            .map_err(|e| load_err("optimize", e))?
            .into_runnable()
            .map_err(|e| load_err("runnable", e))?;

        let mut model = Self {
            plan,
            input_dim,
            output_dim: 0,
        };

        // Probe the output width with a zero row.
        let probe = model.run_row(&vec![0.0; input_dim])?;
        if probe.is_empty() {
            return Err(ServiceError::Registry(
                "onnx output has zero elements".to_string(),
            ));
        }
        model.output_dim = probe.len();
        Ok(model)
    }

    fn run_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        let input: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&[1, self.input_dim]),
            input,
        )
        .map_err(|e| run_err("input reshape", e))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| run_err("run", e))?;
        let first = outputs
            .first()
            .ok_or_else(|| ServiceError::Inference("onnx produced no outputs".to_string()))?;
        let arr = first
            .to_array_view::<f32>()
            .map_err(|e| run_err("output decode", e))?;

        Ok(arr.iter().map(|v| f64::from(*v)).collect())
    }
}

impl Regressor for OnnxRegressor {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        batch
            .iter()
            .map(|row| {
                if row.len() != self.input_dim {
                    return Err(ServiceError::Inference(format!(
                        "onnx input dim mismatch: got {}, expected {}",
                        row.len(),
                        self.input_dim
                    )));
                }
                self.run_row(row)
            })
            .collect()
    }
}
