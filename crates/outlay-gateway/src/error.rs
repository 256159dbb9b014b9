// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error envelope for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use outlay_core::{ErrorCode, OutlayError};
use serde::Serialize;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: &'static str,
    pub code: ErrorCode,
    pub message: String,
    /// Individual field violations, for `VALIDATION_ERROR` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Offending field, for `DUPLICATE_ENTRY` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// An error leaving a handler.
#[derive(Debug)]
pub enum ApiError {
    Domain(OutlayError),
    /// The request body was not a JSON object.
    InvalidJson(String),
}

impl From<OutlayError> for ApiError {
    fn from(e: OutlayError) -> Self {
        ApiError::Domain(e)
    }
}

impl ApiError {
    fn into_body(self) -> ErrorResponse {
        let mut body = ErrorResponse {
            status: "error",
            code: ErrorCode::InternalServerError,
            message: String::new(),
            errors: None,
            field: None,
        };
        match self {
            ApiError::InvalidJson(detail) => {
                tracing::debug!(detail = %detail, "rejected malformed JSON body");
                body.code = ErrorCode::InvalidJson;
                body.message = "Invalid JSON in request body".to_string();
            }
            ApiError::Domain(err) => {
                body.code = err.code();
                if err.is_client_error() {
                    tracing::debug!(code = %body.code, error = %err, "request rejected");
                }
                match err {
                    OutlayError::Validation(errors) => {
                        body.message = "Validation failed".to_string();
                        body.errors = Some(errors);
                    }
                    OutlayError::InvalidIdempotencyKey(msg)
                    | OutlayError::InvalidFilter(msg)
                    | OutlayError::NotFound(msg) => body.message = msg,
                    OutlayError::DuplicateEntry { field } => {
                        body.message = format!("A record with this {field} already exists");
                        body.field = Some(field);
                    }
                    other @ (OutlayError::Storage { .. }
                    | OutlayError::Config(_)
                    | OutlayError::Internal(_)) => {
                        tracing::error!(error = %other, "request failed");
                        body.message = "An unexpected error occurred".to_string();
                    }
                }
            }
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.into_body();
        let status = StatusCode::from_u16(body.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
