// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Outlay expense tracker.
//!
//! This crate provides the domain types, the error taxonomy, idempotency
//! keys, draft validation, and the [`ExpenseStore`] trait shared by the
//! server, the storage backends, and the client.

pub mod error;
pub mod idempotency;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorCode, OutlayError};
pub use idempotency::{IDEMPOTENCY_KEY_FIELD, IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use traits::ExpenseStore;
pub use types::{
    Amount, CreateOutcome, Expense, ExpenseDraft, ExpenseQuery, ExpenseSummary, HealthStatus,
    NewExpense, SortOrder,
};
pub use validation::{ExpenseLimits, ValidatedExpense, validate_draft};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlay_error_has_all_variants() {
        let _config = OutlayError::Config("test".into());
        let _storage = OutlayError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _validation = OutlayError::Validation(vec!["test".into()]);
        let _key = OutlayError::InvalidIdempotencyKey("test".into());
        let _filter = OutlayError::InvalidFilter("test".into());
        let _dup = OutlayError::DuplicateEntry {
            field: "idempotencyKey".into(),
        };
        let _not_found = OutlayError::NotFound("test".into());
        let _internal = OutlayError::Internal("test".into());
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn store_trait_is_object_safe() {
        fn _assert_dyn(_: &dyn ExpenseStore) {}
    }
}
