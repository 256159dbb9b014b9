// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side error taxonomy.

use std::str::FromStr;

use outlay_core::ErrorCode;
use outlay_resilience::RetryableError;
use serde::Deserialize;
use thiserror::Error;

/// Failures seen by [`ExpenseClient`](crate::ExpenseClient) callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (refused, reset, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured request timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Http {
        status: u16,
        /// Parsed from the error envelope when the server sent one.
        code: Option<ErrorCode>,
        message: String,
        /// Per-field messages for validation failures.
        errors: Vec<String>,
    },

    /// A success response whose body could not be understood.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,
}

/// HTTP statuses worth another attempt.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

impl ClientError {
    /// Classify a reqwest failure that happened before a response arrived.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    /// Build an `Http` error from a non-success response body.
    ///
    /// Bodies that are not the server's error envelope keep the raw text as
    /// the message.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            code: Option<String>,
            message: Option<String>,
            #[serde(default)]
            errors: Vec<String>,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => ClientError::Http {
                status,
                code: envelope
                    .code
                    .as_deref()
                    .and_then(|c| ErrorCode::from_str(c).ok()),
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("HTTP {status}")),
                errors: envelope.errors,
            },
            Err(_) => ClientError::Http {
                status,
                code: None,
                message: if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                },
                errors: Vec::new(),
            },
        }
    }

    /// The HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl RetryableError for ClientError {
    fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Http { status, .. } => is_transient_status(*status),
            ClientError::Decode(_) | ClientError::Cancelled => false,
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    fn cancelled() -> Self {
        ClientError::Cancelled
    }
}
