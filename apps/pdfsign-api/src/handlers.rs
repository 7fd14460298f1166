//! HTTP handlers for the pdfsign API

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use pdfsign_core::stamp_signature;

use crate::error::ApiError;
use crate::models::{HealthResponse, RawForm, SignRequest};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfsign-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Handler: POST /upload
///
/// Stores both uploads, stamps the signature and answers with the signed
/// document as an attachment named `signed_<pdf name>`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = RawForm::read(multipart).await?;
    let request = SignRequest::from_form(form)?;

    let (Some(pdf_name), Some(signature_name)) = (
        request.pdf.sanitized_name(),
        request.signature.sanitized_name(),
    ) else {
        return Err(ApiError::MissingFilename);
    };

    state.store_upload(&pdf_name, &request.pdf.bytes).await?;
    state.store_upload(&signature_name, &request.signature.bytes).await?;

    let placement = request.placement(state.default_size);
    tracing::debug!("Signing {} with {}: {:?}", pdf_name, signature_name, placement);

    // Parsing and re-serializing a PDF is CPU bound
    let pdf = request.pdf.bytes.clone();
    let image = request.signature.bytes.clone();
    let signed = tokio::task::spawn_blocking(move || stamp_signature(&pdf, &image, &placement))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let output_name = format!("signed_{}", pdf_name);
    state.store_signed(&output_name, &signed).await?;

    tracing::info!(
        "Signed {} on page {} at ({}, {}): {} bytes",
        pdf_name,
        placement.page,
        placement.rect.x,
        placement.rect.y,
        signed.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output_name),
            ),
        ],
        signed,
    ))
}
