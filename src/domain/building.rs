use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ServiceError, Result};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 8;

/// One input column of the building model, named as the training data named it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    #[serde(rename = "natural_gas_binary")]
    NaturalGasBinary,
    #[serde(rename = "LargestPropertyUseTypeGFA")]
    LargestPropertyUseTypeGfa,
    #[serde(rename = "PropertyGFATotal")]
    PropertyGfaTotal,
    #[serde(rename = "electricity_binary")]
    ElectricityBinary,
    #[serde(rename = "PropertyGFABuilding")]
    PropertyGfaBuilding,
    #[serde(rename = "ENERGYSTARScore")]
    EnergyStarScore,
    #[serde(rename = "building_age")]
    BuildingAge,
    #[serde(rename = "NumberofFloors")]
    NumberOfFloors,
}

impl FeatureName {
    /// Column order the regressor was fitted with.
    pub const TRAINING_ORDER: [FeatureName; FEATURE_COUNT] = [
        FeatureName::NaturalGasBinary,
        FeatureName::LargestPropertyUseTypeGfa,
        FeatureName::PropertyGfaTotal,
        FeatureName::ElectricityBinary,
        FeatureName::PropertyGfaBuilding,
        FeatureName::EnergyStarScore,
        FeatureName::BuildingAge,
        FeatureName::NumberOfFloors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NaturalGasBinary => "natural_gas_binary",
            Self::LargestPropertyUseTypeGfa => "LargestPropertyUseTypeGFA",
            Self::PropertyGfaTotal => "PropertyGFATotal",
            Self::ElectricityBinary => "electricity_binary",
            Self::PropertyGfaBuilding => "PropertyGFABuilding",
            Self::EnergyStarScore => "ENERGYSTARScore",
            Self::BuildingAge => "building_age",
            Self::NumberOfFloors => "NumberofFloors",
        }
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::TRAINING_ORDER
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ServiceError::Registry(format!("unknown feature name: {s}")))
    }
}

/// A validated building record. Only `validation::validate_record` builds one
/// from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingFeatures {
    pub natural_gas_binary: u8,
    pub largest_property_use_type_gfa: f64,
    pub property_gfa_total: u64,
    pub electricity_binary: u8,
    pub property_gfa_building: u64,
    pub energy_star_score: u64,
    pub building_age: u64,
    pub number_of_floors: u64,
}

impl BuildingFeatures {
    pub fn value(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::NaturalGasBinary => f64::from(self.natural_gas_binary),
            FeatureName::LargestPropertyUseTypeGfa => self.largest_property_use_type_gfa,
            FeatureName::PropertyGfaTotal => self.property_gfa_total as f64,
            FeatureName::ElectricityBinary => f64::from(self.electricity_binary),
            FeatureName::PropertyGfaBuilding => self.property_gfa_building as f64,
            FeatureName::EnergyStarScore => self.energy_star_score as f64,
            FeatureName::BuildingAge => self.building_age as f64,
            FeatureName::NumberOfFloors => self.number_of_floors as f64,
        }
    }
}

/// Packing order of the model input vector.
///
/// Always a permutation of [`FeatureName::TRAINING_ORDER`]; a model whose
/// metadata lists its own `feature_names` gets that order, otherwise the
/// training order is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureOrder {
    names: [FeatureName; FEATURE_COUNT],
}

impl Default for FeatureOrder {
    fn default() -> Self {
        Self::training()
    }
}

impl FeatureOrder {
    pub fn training() -> Self {
        Self {
            names: FeatureName::TRAINING_ORDER,
        }
    }

    /// Build an order from model metadata. Every feature must appear exactly once.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.len() != FEATURE_COUNT {
            return Err(ServiceError::Registry(format!(
                "feature_names must list {FEATURE_COUNT} features, got {}",
                names.len()
            )));
        }

        let mut out = FeatureName::TRAINING_ORDER;
        for (slot, raw) in out.iter_mut().zip(names) {
            *slot = raw.as_ref().parse()?;
        }

        for (i, name) in out.iter().enumerate() {
            if out[..i].contains(name) {
                return Err(ServiceError::Registry(format!(
                    "feature_names lists {name} more than once"
                )));
            }
        }

        Ok(Self { names: out })
    }

    pub fn names(&self) -> &[FeatureName] {
        &self.names
    }

    pub fn is_training_order(&self) -> bool {
        self.names == FeatureName::TRAINING_ORDER
    }

    /// Pack a record into the model input vector.
    pub fn vectorize(&self, record: &BuildingFeatures) -> Vec<f64> {
        self.names.iter().map(|name| record.value(*name)).collect()
    }
}
