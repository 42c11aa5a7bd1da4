use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use consommation::{
    api::{create_router, AppState},
    ml::{LoadedModel, ModelFormat, Regressor},
    Result,
};
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tower::ServiceExt;

/// Deterministic stand-in for the fitted model.
struct StubRegressor {
    outputs: Vec<f64>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubRegressor {
    fn returning(outputs: [f64; 2]) -> Arc<Self> {
        Arc::new(Self {
            outputs: outputs.to_vec(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outputs: vec![0.0, 0.0],
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Regressor for StubRegressor {
    fn input_dim(&self) -> usize {
        8
    }

    fn output_dim(&self) -> usize {
        2
    }

    fn predict(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(batch.iter().map(|_| self.outputs.clone()).collect())
    }
}

fn app_with(stub: Arc<StubRegressor>, timeout: Duration) -> Router {
    let model = LoadedModel::new(
        "consommation_model",
        "test",
        ModelFormat::Dense,
        None,
        stub,
    )
    .expect("stub fits the building schema");
    create_router(AppState::new(model), timeout)
}

fn app(stub: Arc<StubRegressor>) -> Router {
    app_with(stub, Duration::from_secs(10))
}

fn sample() -> Value {
    json!({
        "natural_gas_binary": 1,
        "LargestPropertyUseTypeGFA": 12000,
        "PropertyGFATotal": 50000,
        "electricity_binary": 1,
        "PropertyGFABuilding": 48000,
        "ENERGYSTARScore": 75,
        "building_age": 45,
        "NumberofFloors": 10
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(raw) => builder
            .header("content-type", "application/json")
            .body(Body::from(raw))
            .expect("failed to build json request"),
        None => builder
            .body(Body::empty())
            .expect("failed to build empty request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

async fn post_json(app: &Router, payload: Value) -> (StatusCode, Value) {
    let (status, body) = send(app, Method::POST, "/predict", Some(payload.to_string())).await;
    let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
    (status, value)
}

#[tokio::test]
async fn predict_returns_inverse_transformed_targets() {
    let stub = StubRegressor::returning([2.0, 3.0]);
    let app = app(stub.clone());

    let (status, body) = post_json(&app, sample()).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let ghg = body["TotalGHGEmissions"].as_f64().unwrap();
    let energy = body["SiteEnergyUse(kBtu)"].as_f64().unwrap();
    assert!((ghg - 6.389_056_098_930_65).abs() < 1e-9);
    assert!((energy - 19.085_536_923_187_668).abs() < 1e-9);
    assert_eq!(body.as_object().unwrap().len(), 2);
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn predict_accepts_data_envelope() {
    let app = app(StubRegressor::returning([0.0, 1.0]));

    let (status, body) = post_json(&app, json!({ "data": sample() })).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["TotalGHGEmissions"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn key_order_does_not_matter() {
    let app = app(StubRegressor::returning([1.0, 1.0]));
    let reordered = r#"{
        "NumberofFloors": 10,
        "building_age": 45,
        "ENERGYSTARScore": 75,
        "PropertyGFABuilding": 48000,
        "electricity_binary": 1,
        "PropertyGFATotal": 50000,
        "LargestPropertyUseTypeGFA": 12000,
        "natural_gas_binary": 1
    }"#;

    let (a_status, a_body) = send(&app, Method::POST, "/predict", Some(reordered.to_string())).await;
    let (b_status, b_body) = send(&app, Method::POST, "/predict", Some(sample().to_string())).await;
    assert_eq!(a_status, StatusCode::OK);
    assert_eq!(b_status, StatusCode::OK);
    assert_eq!(a_body, b_body);
}

#[tokio::test]
async fn missing_field_is_rejected_before_inference() {
    let stub = StubRegressor::returning([2.0, 3.0]);
    let app = app(stub.clone());

    let mut payload = sample();
    payload.as_object_mut().unwrap().remove("PropertyGFATotal");

    let (status, body) = post_json(&app, payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["field"], "PropertyGFATotal");
    assert_eq!(detail[0]["kind"], "missing");
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn every_bad_field_is_listed() {
    let app = app(StubRegressor::returning([2.0, 3.0]));

    let mut payload = sample();
    let map = payload.as_object_mut().unwrap();
    map.insert("natural_gas_binary".into(), json!(2));
    map.insert("PropertyGFATotal".into(), json!(-1));
    map.insert("building_age".into(), json!("old"));

    let (status, body) = post_json(&app, payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec!["natural_gas_binary", "PropertyGFATotal", "building_age"]
    );
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let stub = StubRegressor::returning([2.0, 3.0]);
    let app = app(stub.clone());

    let (status, body) = send(&app, Method::POST, "/predict", Some("{not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn non_finite_output_is_server_error() {
    let app = app(StubRegressor::returning([1000.0, 1.0]));

    let (status, body) = post_json(&app, sample()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "serialization_error");
}

#[tokio::test]
async fn slow_inference_hits_request_timeout() {
    let app = app_with(
        StubRegressor::slow(Duration::from_millis(500)),
        Duration::from_millis(50),
    );

    let (status, _) = post_json(&app, sample()).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn predict_requires_post() {
    let app = app(StubRegressor::returning([2.0, 3.0]));

    let (status, _) = send(&app, Method::GET, "/predict", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn metadata_reports_feature_order() {
    let app = app(StubRegressor::returning([2.0, 3.0]));

    let (status, body) = send(&app, Method::GET, "/metadata", None).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["name"], "consommation_model");
    assert_eq!(body["feature_names"][0], "natural_gas_binary");
    assert_eq!(body["feature_names"][7], "NumberofFloors");
    assert_eq!(body["feature_names_from_metadata"], false);
    assert_eq!(body["output_names"][1], "SiteEnergyUse(kBtu)");
}

#[tokio::test]
async fn probes_and_metrics() {
    let app = app(StubRegressor::returning([2.0, 3.0]));

    let (status, _) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("consommation_model:test"));

    post_json(&app, sample()).await;
    post_json(&app, json!({})).await;

    let (status, metrics) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(metrics.contains("\nconso_up 1\n"));
    assert!(metrics.contains("conso_predict_requests_total 2"));
    assert!(metrics.contains("conso_predict_success_total 1"));
    assert!(metrics.contains("conso_predict_validation_failures_total 1"));
}
