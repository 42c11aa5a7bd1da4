pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ml;
pub mod services;
pub mod validation;

pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use domain::{BuildingFeatures, FeatureName, FeatureOrder, Prediction};
pub use error::{Result, ServiceError};
pub use ml::{LoadedModel, ModelRegistry, ModelTag, Regressor};
pub use services::Predictor;
