//! On-disk model registry.
//!
//! ```text
//! <root>/<name>/latest                 version string of the current model
//! <root>/<name>/<version>/model.json   manifest
//! <root>/<name>/<version>/<artifact>   weights, format given by the manifest
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{FeatureOrder, FEATURE_COUNT, TARGET_COUNT};
use crate::error::{ServiceError, Result};
use crate::ml::dense::DenseNetwork;
use crate::ml::regressor::Regressor;

pub const LATEST: &str = "latest";
pub const MANIFEST_FILE: &str = "model.json";

/// `"<name>:<version>"`; a bare name means `latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTag {
    pub name: String,
    pub version: String,
}

impl FromStr for ModelTag {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = match s.trim().split_once(':') {
            Some((name, version)) => (name.trim(), version.trim()),
            None => (s.trim(), LATEST),
        };
        if name.is_empty() || version.is_empty() {
            return Err(ServiceError::Registry(format!("invalid model tag: {s:?}")));
        }
        let bad_segment = |seg: &str| seg.contains(['/', '\\']) || seg == "..";
        if bad_segment(name) || bad_segment(version) {
            return Err(ServiceError::Registry(format!(
                "model tag must not contain path separators: {s:?}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Dense,
    Onnx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub version: String,
    pub format: ModelFormat,
    /// Artifact path relative to the version directory.
    pub artifact: PathBuf,
    /// Input columns in fitting order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub output_names: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Descriptive half of a loaded model, served by `/metadata`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub format: ModelFormat,
    pub feature_names: Vec<String>,
    pub feature_names_from_metadata: bool,
    pub output_names: Vec<String>,
    pub metadata: serde_json::Value,
}

/// An immutable, ready-to-serve model plus its packing order.
#[derive(Clone)]
pub struct LoadedModel {
    pub info: ModelInfo,
    pub feature_order: FeatureOrder,
    pub regressor: Arc<dyn Regressor>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("info", &self.info)
            .field("feature_order", &self.feature_order)
            .finish()
    }
}

impl LoadedModel {
    /// Wrap an already-built regressor, checking it fits the building schema.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        format: ModelFormat,
        feature_order: Option<FeatureOrder>,
        regressor: Arc<dyn Regressor>,
    ) -> Result<Self> {
        if regressor.input_dim() != FEATURE_COUNT {
            return Err(ServiceError::Registry(format!(
                "model expects {} inputs, building schema has {FEATURE_COUNT}",
                regressor.input_dim()
            )));
        }
        if regressor.output_dim() != TARGET_COUNT {
            return Err(ServiceError::Registry(format!(
                "model produces {} outputs, expected {TARGET_COUNT}",
                regressor.output_dim()
            )));
        }

        let from_metadata = feature_order.is_some();
        let feature_order = feature_order.unwrap_or_default();

        Ok(Self {
            info: ModelInfo {
                name: name.into(),
                version: version.into(),
                format,
                feature_names: feature_order
                    .names()
                    .iter()
                    .map(|n| n.as_str().to_string())
                    .collect(),
                feature_names_from_metadata: from_metadata,
                output_names: vec![
                    "TotalGHGEmissions".to_string(),
                    "SiteEnergyUse(kBtu)".to_string(),
                ],
                metadata: serde_json::Value::Null,
            },
            feature_order,
            regressor,
        })
    }

    pub fn tag(&self) -> String {
        format!("{}:{}", self.info.name, self.info.version)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Versions stored for `name`, sorted ascending.
    pub fn versions(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.root.join(name);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.path().join(MANIFEST_FILE).is_file() {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Turn `latest` into a concrete version; other versions pass through.
    pub fn resolve(&self, tag: &ModelTag) -> Result<ModelTag> {
        let not_found = || ServiceError::ModelNotFound {
            name: tag.name.clone(),
            version: tag.version.clone(),
        };

        let version = if tag.version == LATEST {
            let pointer = self.root.join(&tag.name).join(LATEST);
            match std::fs::read_to_string(&pointer) {
                Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
                _ => self.versions(&tag.name)?.pop().ok_or_else(not_found)?,
            }
        } else {
            tag.version.clone()
        };

        if !self.version_dir(&tag.name, &version).join(MANIFEST_FILE).is_file() {
            return Err(not_found());
        }

        Ok(ModelTag {
            name: tag.name.clone(),
            version,
        })
    }

    fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }

    pub fn manifest(&self, tag: &ModelTag) -> Result<ModelManifest> {
        let path = self.version_dir(&tag.name, &tag.version).join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path)?;
        let manifest: ModelManifest = serde_json::from_str(&raw)?;
        Ok(manifest)
    }

    /// Resolve, read and build the model named by `tag`.
    pub fn load(&self, tag: &ModelTag) -> Result<LoadedModel> {
        let resolved = self.resolve(tag)?;
        let manifest = self.manifest(&resolved)?;
        let dir = self.version_dir(&resolved.name, &resolved.version);
        let artifact = dir.join(&manifest.artifact);

        let regressor: Arc<dyn Regressor> = match manifest.format {
            ModelFormat::Dense => Arc::new(DenseNetwork::from_file(&artifact)?),
            ModelFormat::Onnx => load_onnx(&artifact)?,
        };

        let feature_order = match &manifest.feature_names {
            Some(names) => Some(FeatureOrder::from_names(names)?),
            None => {
                warn!(
                    model = %resolved,
                    "model metadata has no feature_names; packing inputs in default training order"
                );
                None
            }
        };

        let mut model = LoadedModel::new(
            resolved.name.clone(),
            resolved.version.clone(),
            manifest.format,
            feature_order,
            regressor,
        )?;
        if let Some(outputs) = manifest.output_names {
            if outputs.len() != TARGET_COUNT {
                return Err(ServiceError::Registry(format!(
                    "output_names lists {} targets, expected {TARGET_COUNT}",
                    outputs.len()
                )));
            }
            model.info.output_names = outputs;
        }
        model.info.metadata = manifest.metadata;

        info!(
            model = %resolved,
            format = ?manifest.format,
            features = ?model.info.feature_names,
            "model loaded"
        );
        Ok(model)
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(artifact: &Path) -> Result<Arc<dyn Regressor>> {
    Ok(Arc::new(crate::ml::onnx::OnnxRegressor::load(
        artifact,
        FEATURE_COUNT,
    )?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(artifact: &Path) -> Result<Arc<dyn Regressor>> {
    Err(ServiceError::Registry(format!(
        "{} is an onnx model but this build has no onnx support (enable the `onnx` feature)",
        artifact.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags() {
        let tag: ModelTag = "consommation_model:latest".parse().unwrap();
        assert_eq!(tag.name, "consommation_model");
        assert_eq!(tag.version, "latest");

        let bare: ModelTag = "consommation_model".parse().unwrap();
        assert_eq!(bare.version, LATEST);
        assert_eq!(bare.to_string(), "consommation_model:latest");

        assert!("".parse::<ModelTag>().is_err());
        assert!("m:".parse::<ModelTag>().is_err());
        assert!("../etc:v1".parse::<ModelTag>().is_err());
    }

    #[test]
    fn missing_registry_is_model_not_found() {
        let registry = ModelRegistry::new(
            std::env::temp_dir().join(format!("conso-empty-{}", uuid::Uuid::new_v4())),
        );
        let tag: ModelTag = "consommation_model:latest".parse().unwrap();
        assert!(matches!(
            registry.load(&tag),
            Err(ServiceError::ModelNotFound { .. })
        ));
    }
}
