// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Outlay expense tracker.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type shared by the store, write path, and HTTP layer.
#[derive(Debug, Error)]
pub enum OutlayError {
    /// Configuration errors (invalid TOML, out-of-range limits).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Field-level validation failures, collected in field order.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// An idempotency key was supplied but is blank or not a string.
    #[error("invalid idempotency key: {0}")]
    InvalidIdempotencyKey(String),

    /// A list filter or sort selector could not be interpreted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// An insert collided with a unique constraint.
    #[error("a record with this {field} already exists")]
    DuplicateEntry { field: String },

    /// Route or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OutlayError {
    /// Machine-readable classification reported in the HTTP error envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            OutlayError::Validation(_) => ErrorCode::ValidationError,
            OutlayError::InvalidIdempotencyKey(_) => ErrorCode::InvalidIdempotencyKey,
            OutlayError::InvalidFilter(_) => ErrorCode::InvalidFilter,
            OutlayError::DuplicateEntry { .. } => ErrorCode::DuplicateEntry,
            OutlayError::NotFound(_) => ErrorCode::NotFound,
            OutlayError::Config(_) | OutlayError::Storage { .. } | OutlayError::Internal(_) => {
                ErrorCode::InternalServerError
            }
        }
    }

    /// Whether the error reflects a bad request rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }
}

/// Classification codes carried in the `code` field of error responses.
///
/// The server renders these and the client parses them back, so the string
/// forms are part of the wire contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidJson,
    InvalidIdempotencyKey,
    InvalidFilter,
    DuplicateEntry,
    NotFound,
    InternalServerError,
}

impl ErrorCode {
    /// HTTP status paired with this code.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidJson
            | ErrorCode::InvalidIdempotencyKey
            | ErrorCode::InvalidFilter => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::DuplicateEntry => 409,
            ErrorCode::InternalServerError => 500,
        }
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn error_codes_round_trip_through_strings() {
        let codes = [
            ErrorCode::ValidationError,
            ErrorCode::InvalidJson,
            ErrorCode::InvalidIdempotencyKey,
            ErrorCode::InvalidFilter,
            ErrorCode::DuplicateEntry,
            ErrorCode::NotFound,
            ErrorCode::InternalServerError,
        ];
        for code in codes {
            let s = code.to_string();
            assert_eq!(ErrorCode::from_str(&s).unwrap(), code);
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
        assert_eq!(
            ErrorCode::InvalidIdempotencyKey.to_string(),
            "INVALID_IDEMPOTENCY_KEY"
        );
    }

    #[test]
    fn internal_failures_share_one_public_code() {
        let storage = OutlayError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert_eq!(storage.code(), ErrorCode::InternalServerError);
        assert_eq!(
            OutlayError::Config("bad".into()).code(),
            ErrorCode::InternalServerError
        );
        assert!(!storage.is_client_error());
    }

    #[test]
    fn validation_display_joins_messages() {
        let err = OutlayError::Validation(vec![
            "Amount must be greater than 0".into(),
            "Description cannot be empty".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: Amount must be greater than 0; Description cannot be empty"
        );
        assert!(err.is_client_error());
        assert_eq!(err.code().http_status(), 400);
    }

    #[test]
    fn duplicate_entry_names_the_field() {
        let err = OutlayError::DuplicateEntry {
            field: "idempotencyKey".into(),
        };
        assert_eq!(
            err.to_string(),
            "a record with this idempotencyKey already exists"
        );
        assert_eq!(err.code().http_status(), 409);
    }
}
