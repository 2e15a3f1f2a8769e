//! HTTP surface: JSON routes over the prediction service. Missing request
//! keys are rejected here with 400; service-level failures come back as
//! `{success:false, error}` with 500.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use sentinel_core::PredictionService;
use serde_json::{json, Value};

const SERVICE_NAME: &str = "inference-gateway";
const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

pub fn router(state: AppState, cors_origins: &str) -> Router {
    let origin =
        HeaderValue::from_str(cors_origins).unwrap_or_else(|_| HeaderValue::from_static("*"));
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/model/info", get(model_info))
        .route("/api/predict", post(predict))
        .route("/api/predict/batch", post(predict_batch))
        .route("/api/example", get(example))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let origin = origin.clone();
            async move {
                let mut res = next.run(req).await;
                res.headers_mut()
                    .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
                res
            }
        }))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": true,
        "service": SERVICE_NAME,
    }))
}

async fn model_info(State(state): State<AppState>) -> Json<Value> {
    Json(to_json(&state.service.capabilities()))
}

async fn predict(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(input) = body.get("input") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "No input data provided. Use 'input' key.",
            })),
        );
    };
    let result = state.service.predict(input);
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(to_json(&result)))
}

async fn predict_batch(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(inputs) = body.get("inputs") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "No input data provided. Use 'inputs' key for batch processing.",
            })),
        );
    };
    let Some(batch) = inputs.as_array() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Batch data must be a list of inputs",
            })),
        );
    };
    let result = state.service.predict_batch(batch);
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(to_json(&result)))
}

async fn example(State(state): State<AppState>) -> Json<Value> {
    let n = state.service.model_info().input_size;
    Json(json!({
        "description": "Example input format for the model",
        "input_size": n,
        "single_prediction": { "input": vec![0.1_f32; n] },
        "batch_prediction": { "inputs": [vec![0.1_f32; n], vec![0.2_f32; n]] },
    }))
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({"success": false, "error": format!("response serialization failed: {e}")})
    })
}
