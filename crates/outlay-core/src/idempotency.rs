// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency keys correlating retried create requests.
//!
//! A key is generated once per logical submission on the client and sent
//! with every retry of that submission. The server uses it to recognize a
//! request it has already applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OutlayError;

/// HTTP header carrying the key. Takes precedence over the body field.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// JSON body field accepted when the header is absent.
pub const IDEMPOTENCY_KEY_FIELD: &str = "idempotencyKey";

/// A validated, non-blank idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Generates a fresh random (version 4 UUID) key.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Validates a raw key. Surrounding whitespace is trimmed; a key that is
    /// empty after trimming is rejected.
    pub fn parse(raw: &str) -> Result<Self, OutlayError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OutlayError::InvalidIdempotencyKey(
                "Idempotency-Key must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Validates a key taken from a JSON body. Non-string values are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, OutlayError> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            _ => Err(OutlayError::InvalidIdempotencyKey(
                "Idempotency-Key must be a non-empty string".to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IdempotencyKey {
    type Err = OutlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for IdempotencyKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
