//! Error types for the pdfsign API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfsign_core::SignError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("PDF or signature filename missing")]
    MissingFilename,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Failed to sign PDF: {0}")]
    Sign(#[from] SignError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingField(_)
            | ApiError::InvalidField { .. }
            | ApiError::MissingFilename
            | ApiError::InvalidRequest(_) => {
                tracing::warn!("Rejected upload: {}", self);
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::PayloadTooLarge => {
                tracing::warn!("Rejected upload: {}", self);
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ApiError::Sign(e) if e.is_client_error() => {
                tracing::error!("Error signing PDF: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::Sign(e) => {
                tracing::error!("Error signing PDF: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to sign PDF".to_string(),
                )
            }
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store file".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
