//! Error taxonomy for the detector and the HTTP surface.
//!
//! Model-load failure is the only fatal error; everything that happens per
//! request is converted into the uniform `{"detail": ...}` envelope at the
//! service boundary and never crashes the process.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures inside the inference gateway.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("failed to preprocess image: {0}")]
    Preprocess(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    Output(String),
}

/// Per-request errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File must be an image")]
    InvalidUpload,
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        ApiError::Prediction(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidUpload => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable | ApiError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_upload_is_a_client_error() {
        let response = ApiError::InvalidUpload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn detect_errors_become_prediction_failures() {
        let err: ApiError = DetectError::Inference("session run failed".into()).into();
        assert_eq!(
            err.to_string(),
            "Prediction failed: inference failed: session run failed"
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
