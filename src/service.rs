//! HTTP surface: router, shared state, and request handlers.
//!
//! Handlers hold the detection engine behind [`InferenceBackend`], injected
//! through [`AppState`] at startup; there is no ambient global model. All
//! request failures surface as the uniform `{"detail": ...}` envelope.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::analysis::{analyze, round2};
use crate::detection::normalize;
use crate::error::ApiError;
use crate::mapping::{CORRECTED_NAMES, class_names};
use crate::model::InferenceBackend;

/// Shared per-process state.
///
/// `backend` is `None` only when no model has been loaded; every inference
/// endpoint checks this and reports the model as unavailable.
#[derive(Clone)]
pub struct AppState {
    pub backend: Option<Arc<dyn InferenceBackend>>,
    /// Confidence gate applied while decoding model output.
    pub confidence_threshold: f32,
    /// Confidence gate applied when bucketing detections for the verdict.
    pub bucket_threshold: f32,
}

/// Build the router with permissive development CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/model-info", get(model_info))
        .route("/classes", get(classes))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Helmet detection service is running!" }))
}

async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Prediction(e.to_string()))?
        .ok_or(ApiError::InvalidUpload)?;

    if !field
        .content_type()
        .is_some_and(|ct| ct.starts_with("image/"))
    {
        return Err(ApiError::InvalidUpload);
    }
    let filename = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::Prediction(format!("failed to read upload: {e}")))?;

    let backend = state.backend.as_ref().ok_or(ApiError::ModelUnavailable)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| ApiError::Prediction(format!("failed to decode image: {e}")))?;

    let raw = backend
        .detect(&image, state.confidence_threshold)
        .map_err(|e| {
            tracing::error!(error = %e, %filename, "inference failed");
            ApiError::from(e)
        })?;
    let detections = normalize(&raw, state.bucket_threshold);
    let verdict = analyze(&detections);
    tracing::debug!(
        raw = raw.len(),
        kept = detections.len(),
        status = ?verdict.status,
        %filename,
        "processed upload"
    );

    let with_helmet_count = detections
        .iter()
        .filter(|det| det.class_id == crate::mapping::WITH_HELMET)
        .count();
    let without_helmet_count = detections
        .iter()
        .filter(|det| det.class_id == crate::mapping::WITHOUT_HELMET)
        .count();
    let all_detections: Vec<Value> = detections
        .iter()
        .map(|det| {
            json!({
                "class": det.corrected_label,
                "confidence": round2(det.confidence * 100.0),
                "bbox": det.bbox.iter().map(|&v| round2(v)).collect::<Vec<f32>>(),
            })
        })
        .collect();

    let details = match &verdict.details {
        Some(details) => json!(details),
        None => json!({}),
    };

    Ok(Json(json!({
        "filename": filename,
        "prediction": verdict.status,
        "message": verdict.message,
        "confidence": round2(verdict.confidence),
        "is_wearing_helmet": verdict.is_wearing_helmet,
        "details": details,
        "raw_detections": {
            "with_helmet_count": with_helmet_count,
            "without_helmet_count": without_helmet_count,
            "total_detections": detections.len(),
            "all_detections": all_detections,
        },
    })))
}

async fn model_info(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let backend = state.backend.as_ref().ok_or(ApiError::ModelUnavailable)?;
    let size = backend.input_size();
    Ok(Json(json!({
        "model_type": "YOLOv8",
        "model_name": backend.model_name(),
        "classes": class_names(),
        "class_count": CORRECTED_NAMES.len(),
        "status": "loaded",
        "input_size": format!("{size}x{size}"),
        "framework": "ONNX Runtime",
    })))
}

async fn classes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.backend.is_none() {
        return Err(ApiError::ModelUnavailable);
    }
    let classes: serde_json::Map<String, Value> = CORRECTED_NAMES
        .iter()
        .map(|(id, name)| (id.to_string(), Value::from(*name)))
        .collect();
    Ok(Json(json!({
        "classes": classes,
        "total_classes": CORRECTED_NAMES.len(),
    })))
}
