//! Manual smoke test: post one sample building to a running service.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::Result;

/// The sample building, wrapped the way the service's own clients send it.
pub fn sample_payload() -> Value {
    json!({
        "data": {
            "natural_gas_binary": 1,
            "LargestPropertyUseTypeGFA": 12000,
            "PropertyGFATotal": 50000,
            "electricity_binary": 1,
            "PropertyGFABuilding": 48000,
            "ENERGYSTARScore": 75,
            "building_age": 45,
            "NumberofFloors": 10
        }
    })
}

#[derive(Debug)]
pub struct SmokeResult {
    pub status: StatusCode,
    pub body: Value,
}

pub struct SmokeClient {
    http: Client,
    url: String,
}

impl SmokeClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub async fn post(&self, payload: &Value) -> Result<SmokeResult> {
        let response = self.http.post(&self.url).json(payload).send().await?;
        let status = response.status();
        let text = response.text().await?;
        // Error pages are not always JSON; keep them readable.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(SmokeResult { status, body })
    }

    pub async fn run(&self) -> Result<SmokeResult> {
        self.post(&sample_payload()).await
    }
}
