// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency gate for expense creation.
//!
//! Resolves the key a request carries and short-circuits requests whose key
//! already has a stored record. The gate is a read-before-write shortcut;
//! the store's unique index is what actually prevents duplicates.

use std::sync::Arc;

use axum::http::HeaderMap;
use outlay_core::{
    Expense, ExpenseDraft, ExpenseStore, IDEMPOTENCY_KEY_HEADER, IdempotencyKey, OutlayError,
};
use tracing::{debug, info, warn};

/// Pick the key for a create request.
///
/// The `Idempotency-Key` header wins; the `idempotencyKey` body field is
/// consulted only when the header is absent. `Ok(None)` means the request
/// carries no key at all and will not be deduplicated.
pub fn extract_key(
    headers: &HeaderMap,
    draft: &ExpenseDraft,
) -> Result<Option<IdempotencyKey>, OutlayError> {
    if let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) {
        let raw = value.to_str().map_err(|_| {
            OutlayError::InvalidIdempotencyKey(
                "Idempotency-Key header must be valid UTF-8 text".to_string(),
            )
        })?;
        return IdempotencyKey::parse(raw).map(Some);
    }

    match &draft.idempotency_key {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => IdempotencyKey::from_json(value).map(Some),
    }
}

/// Looks keys up in the record store.
#[derive(Clone)]
pub struct IdempotencyGate {
    store: Arc<dyn ExpenseStore>,
}

impl IdempotencyGate {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }

    /// Return the stored record for `key`, if the request was already applied.
    ///
    /// A missing key is logged and passes through: such requests are never
    /// deduplicated.
    pub async fn check(&self, key: Option<&IdempotencyKey>) -> Result<Option<Expense>, OutlayError> {
        let Some(key) = key else {
            warn!("create request without idempotency key; duplicates will not be detected");
            return Ok(None);
        };

        match self.store.find_by_idempotency_key(key).await? {
            Some(existing) => {
                info!(key = %key, id = %existing.id, "replaying stored expense");
                Ok(Some(existing))
            }
            None => {
                debug!(key = %key, "idempotency key not seen before");
                Ok(None)
            }
        }
    }
}
