// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for expense persistence backends (SQLite, in-memory).

use async_trait::async_trait;

use crate::error::OutlayError;
use crate::idempotency::IdempotencyKey;
use crate::types::{Expense, ExpenseQuery, ExpenseSummary, HealthStatus};

/// Persistent record store queried by exact-match key lookup.
///
/// Implementations must enforce uniqueness of non-null idempotency keys at
/// the storage level. Records without a key never collide with each other.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Reports whether the backend can serve queries.
    async fn health_check(&self) -> Result<HealthStatus, OutlayError>;

    /// Returns the record holding `key`, if any.
    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Expense>, OutlayError>;

    /// Inserts a new record.
    ///
    /// Returns [`OutlayError::DuplicateEntry`] when another record already
    /// holds the same idempotency key; nothing is written in that case.
    async fn insert(&self, expense: &Expense) -> Result<(), OutlayError>;

    /// Lists records matching `query` with their count and summed amount.
    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, OutlayError>;
}
