// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expense write path: validate, persist, and recover from key races.

use std::sync::Arc;

use chrono::NaiveDate;
use outlay_core::{
    CreateOutcome, ExpenseDraft, ExpenseLimits, ExpenseStore, IdempotencyKey, OutlayError,
    validate_draft,
};
use tracing::{info, warn};

fn utc_today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Creates expenses that passed the idempotency gate.
#[derive(Clone)]
pub struct ExpenseWriteService {
    store: Arc<dyn ExpenseStore>,
    limits: ExpenseLimits,
    today: fn() -> NaiveDate,
}

impl ExpenseWriteService {
    pub fn new(store: Arc<dyn ExpenseStore>, limits: ExpenseLimits) -> Self {
        Self {
            store,
            limits,
            today: utc_today,
        }
    }

    /// Replace the source of "today" used for the future-date check.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Validate `draft` and persist it under `key`.
    ///
    /// If a concurrent request with the same key wins the insert, the
    /// winner's record is returned as a replay instead of an error.
    pub async fn create(
        &self,
        draft: &ExpenseDraft,
        key: Option<IdempotencyKey>,
    ) -> Result<CreateOutcome, OutlayError> {
        let validated = validate_draft(draft, &self.limits, (self.today)())?;
        let expense = validated.into_expense(key.clone());

        match self.store.insert(&expense).await {
            Ok(()) => {
                info!(
                    id = %expense.id,
                    amount = %expense.amount,
                    category = %expense.category,
                    keyed = key.is_some(),
                    "expense created"
                );
                Ok(CreateOutcome::created(expense))
            }
            Err(OutlayError::DuplicateEntry { field }) => match key {
                Some(key) => self.recover(&key).await,
                None => Err(OutlayError::DuplicateEntry { field }),
            },
            Err(e) => Err(e),
        }
    }

    async fn recover(&self, key: &IdempotencyKey) -> Result<CreateOutcome, OutlayError> {
        match self.store.find_by_idempotency_key(key).await? {
            Some(winner) => {
                warn!(key = %key, id = %winner.id, "lost idempotency race; replaying winner");
                Ok(CreateOutcome::replayed(winner))
            }
            None => Err(OutlayError::Internal(format!(
                "insert for key {key} conflicted but no record holds it"
            ))),
        }
    }
}
