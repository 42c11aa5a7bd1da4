//! Model loading and inference.
//!
//! Everything here is synchronous and CPU-only; the HTTP layer decides which
//! thread runs it.

pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;
pub mod regressor;

pub use dense::{Activation, DenseLayer, DenseNetwork};
#[cfg(feature = "onnx")]
pub use onnx::OnnxRegressor;
pub use registry::{LoadedModel, ModelFormat, ModelInfo, ModelManifest, ModelRegistry, ModelTag};
pub use regressor::{InferenceAdapter, Regressor};
