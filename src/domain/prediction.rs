use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, Result};

/// Number of regressor output columns (log-emissions, log-energy-use).
pub const TARGET_COUNT: usize = 2;

/// Undo the `log1p` applied to the targets before fitting.
pub fn inverse_log1p(x: f64) -> f64 {
    x.exp_m1()
}

/// Model output in original units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "TotalGHGEmissions")]
    pub total_ghg_emissions: f64,
    #[serde(rename = "SiteEnergyUse(kBtu)")]
    pub site_energy_use_kbtu: f64,
}

impl Prediction {
    /// Map one row of raw log-space model output to named targets.
    ///
    /// Non-finite values pass through unchanged; see [`Prediction::ensure_encodable`].
    pub fn from_log_outputs(row: &[f64]) -> Result<Self> {
        if row.len() != TARGET_COUNT {
            return Err(ServiceError::Inference(format!(
                "model output width mismatch: got {}, expected {TARGET_COUNT}",
                row.len()
            )));
        }

        Ok(Self {
            total_ghg_emissions: inverse_log1p(row[0]),
            site_energy_use_kbtu: inverse_log1p(row[1]),
        })
    }

    pub fn is_finite(&self) -> bool {
        self.total_ghg_emissions.is_finite() && self.site_energy_use_kbtu.is_finite()
    }

    /// JSON has no NaN or infinity; `serde_json` would silently emit `null`.
    pub fn ensure_encodable(self) -> Result<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(ServiceError::Serialization(format!(
                "non-finite prediction: TotalGHGEmissions={}, SiteEnergyUse(kBtu)={}",
                self.total_ghg_emissions, self.site_energy_use_kbtu
            )))
        }
    }
}
