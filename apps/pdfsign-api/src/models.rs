//! Request and response models for the pdfsign API

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use pdfsign_core::{Placement, Rect};
use serde::Serialize;

use crate::error::ApiError;
use crate::filename::sanitize_filename;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// A file part from the multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the client, unsanitized
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn sanitized_name(&self) -> Option<String> {
        sanitize_filename(&self.file_name)
    }
}

/// Multipart body split into file parts and plain text fields
#[derive(Debug, Default)]
pub struct RawForm {
    pub files: HashMap<String, UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl RawForm {
    /// Drain a multipart stream. Parts that carry a `filename` are files,
    /// everything else is a text field. Later parts win on duplicate names.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = RawForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            match file_name {
                Some(file_name) => {
                    form.files.insert(name, UploadedFile { file_name, bytes });
                }
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }

        Ok(form)
    }

    fn file(&mut self, name: &'static str) -> Result<UploadedFile, ApiError> {
        self.files.remove(name).ok_or(ApiError::MissingField(name))
    }

    fn text(&self, name: &'static str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or(ApiError::MissingField(name))
    }

    fn integer(&self, name: &'static str) -> Result<i64, ApiError> {
        let value = self.text(name)?;
        value.trim().parse().map_err(|_| invalid(name, value))
    }

    fn float(&self, name: &'static str) -> Result<f64, ApiError> {
        let value = self.text(name)?;
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(name, value))
    }

    fn optional_float(&self, name: &'static str) -> Result<Option<f64>, ApiError> {
        match self.fields.get(name) {
            Some(value) if !value.trim().is_empty() => self.float(name).map(Some),
            _ => Ok(None),
        }
    }

    fn optional_bool(&self, name: &'static str) -> Result<Option<bool>, ApiError> {
        let Some(value) = self.fields.get(name) else {
            return Ok(None);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(invalid(name, value)),
        }
    }
}

fn invalid(field: &'static str, value: &str) -> ApiError {
    ApiError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}

/// Validated `/upload` request
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub pdf: UploadedFile,
    pub signature: UploadedFile,
    pub page: i64,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub keep_proportion: bool,
}

impl SignRequest {
    pub fn from_form(mut form: RawForm) -> Result<Self, ApiError> {
        let pdf = form.file("pdf")?;
        let signature = form.file("signature")?;
        Ok(Self {
            pdf,
            signature,
            page: form.integer("page")?,
            x: form.float("x")?,
            y: form.float("y")?,
            width: form.optional_float("width")?,
            height: form.optional_float("height")?,
            keep_proportion: form.optional_bool("keep_proportion")?.unwrap_or(true),
        })
    }

    pub fn placement(&self, default_size: (f64, f64)) -> Placement {
        let rect = Rect::new(
            self.x,
            self.y,
            self.width.unwrap_or(default_size.0),
            self.height.unwrap_or(default_size.1),
        );
        Placement::new(self.page, rect).with_keep_proportion(self.keep_proportion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form(fields: &[(&str, &str)]) -> RawForm {
        let mut form = RawForm::default();
        for name in ["pdf", "signature"] {
            form.files.insert(
                name.to_string(),
                UploadedFile {
                    file_name: format!("{}.bin", name),
                    bytes: Bytes::from_static(b"data"),
                },
            );
        }
        for (name, value) in fields {
            form.fields.insert(name.to_string(), value.to_string());
        }
        form
    }

    #[test]
    fn test_required_fields_parsed() {
        let req = SignRequest::from_form(form(&[("page", " 2 "), ("x", "10.5"), ("y", "-3")]))
            .unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.x, 10.5);
        assert_eq!(req.y, -3.0);
        assert_eq!(req.width, None);
        assert!(req.keep_proportion);
    }

    #[test]
    fn test_defaults_fill_placement() {
        let req = SignRequest::from_form(form(&[("page", "0"), ("x", "1"), ("y", "2")])).unwrap();
        let placement = req.placement((150.0, 50.0));
        assert_eq!(placement.rect, Rect::new(1.0, 2.0, 150.0, 50.0));
    }

    #[test]
    fn test_optional_fields_override_defaults() {
        let req = SignRequest::from_form(form(&[
            ("page", "-1"),
            ("x", "1"),
            ("y", "2"),
            ("width", "80"),
            ("height", ""),
            ("keep_proportion", "off"),
        ]))
        .unwrap();
        let placement = req.placement((150.0, 50.0));
        assert_eq!(placement.page, -1);
        assert_eq!(placement.rect, Rect::new(1.0, 2.0, 80.0, 50.0));
        assert!(!placement.keep_proportion);
    }

    #[test]
    fn test_missing_field_named() {
        let err = SignRequest::from_form(form(&[("page", "0"), ("x", "1")])).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("y")));
    }

    #[test]
    fn test_missing_file_named() {
        let mut raw = form(&[("page", "0"), ("x", "1"), ("y", "1")]);
        raw.files.remove("signature");
        let err = SignRequest::from_form(raw).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("signature")));
    }

    #[test]
    fn test_fractional_page_rejected() {
        let err = SignRequest::from_form(form(&[("page", "1.5"), ("x", "1"), ("y", "1")]))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidField { field: "page", .. }));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        for bad in ["nan", "inf", "-infinity", "abc"] {
            let err = SignRequest::from_form(form(&[("page", "0"), ("x", bad), ("y", "1")]))
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidField { field: "x", .. }), "{}", bad);
        }
    }

    #[test]
    fn test_bad_bool_rejected() {
        let err = SignRequest::from_form(form(&[
            ("page", "0"),
            ("x", "1"),
            ("y", "1"),
            ("keep_proportion", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidField {
                field: "keep_proportion",
                ..
            }
        ));
    }
}
