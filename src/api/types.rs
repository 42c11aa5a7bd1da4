use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ml::ModelInfo;

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
}

// ============================================================================
// Model Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MetadataResponse {
    #[serde(flatten)]
    pub model: ModelInfo,
    pub service_version: String,
}
