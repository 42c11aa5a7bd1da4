//! Dense network regressor loaded from JSON.
//!
//! A linear regression is the one-layer, `linear`-activation case; small MLPs
//! exported from a training notebook fit the same format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ServiceError, Result};
use crate::ml::regressor::Regressor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let sum = row.iter().zip(x).fold(*b, |acc, (w, xi)| acc + w * xi);
                self.activation.apply(sum)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub input_dim: usize,

    /// Optional z-score standardization applied before the first layer.
    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Registry(format!("cannot read {}: {e}", path.display()))
        })?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ServiceError::Registry(msg));

        if self.input_dim == 0 {
            return invalid("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return invalid("layers must not be empty".to_string());
        }
        match (&self.input_mean, &self.input_std) {
            (Some(mean), Some(std)) => {
                if mean.len() != self.input_dim || std.len() != self.input_dim {
                    return invalid(format!(
                        "input_mean/input_std lengths ({}, {}) != input_dim {}",
                        mean.len(),
                        std.len(),
                        self.input_dim
                    ));
                }
                if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return invalid("input_std must be finite and > 0".to_string());
                }
            }
            (None, None) => {}
            _ => return invalid("input_mean and input_std must be provided together".to_string()),
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return invalid(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return invalid(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            if let Some(r) = layer.weights.iter().position(|row| row.len() != expected_in) {
                return invalid(format!(
                    "layer[{idx}] weights row {r} len != expected in_dim {expected_in}"
                ));
            }
            let non_finite = layer
                .weights
                .iter()
                .flatten()
                .chain(&layer.bias)
                .any(|v| !v.is_finite());
            if non_finite {
                return invalid(format!("layer[{idx}] has non-finite parameters"));
            }
            expected_in = layer.out_dim();
        }
        Ok(())
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(ServiceError::Inference(format!(
                "DenseNetwork input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x = match (&self.input_mean, &self.input_std) {
            (Some(mean), Some(std)) => input
                .iter()
                .zip(mean.iter().zip(std))
                .map(|(v, (m, s))| (v - m) / s.max(1e-12))
                .collect(),
            _ => input.to_vec(),
        };

        for layer in &self.layers {
            x = layer.forward(&x);
        }

        Ok(x)
    }
}

impl Regressor for DenseNetwork {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        batch.iter().map(|row| self.forward(row)).collect()
    }
}
