// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory expense store for deterministic tests.
//!
//! `MemoryExpenseStore` enforces the same key uniqueness as the SQLite
//! store and can hold key lookups at a rendezvous, so that several
//! concurrent creates with one key all miss the gate and race on insert.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Barrier, Mutex};

use outlay_core::{
    Amount, Expense, ExpenseQuery, ExpenseStore, ExpenseSummary, HealthStatus,
    IDEMPOTENCY_KEY_FIELD, IdempotencyKey, OutlayError, SortOrder,
};

/// Vec-backed [`ExpenseStore`].
pub struct MemoryExpenseStore {
    records: Mutex<Vec<Expense>>,
    rendezvous: Option<(Barrier, usize)>,
    lookups: AtomicUsize,
    inserts: AtomicUsize,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            rendezvous: None,
            lookups: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
        }
    }

    /// The first `parties` key lookups complete only once all of them have
    /// run. Later lookups pass straight through.
    pub fn with_lookup_rendezvous(parties: usize) -> Self {
        Self {
            rendezvous: Some((Barrier::new(parties), parties)),
            ..Self::new()
        }
    }

    /// Stored records in insertion order.
    pub async fn records(&self) -> Vec<Expense> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Inserts attempted, including those rejected as duplicates.
    pub fn insert_attempts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

impl Default for MemoryExpenseStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_records(records: &mut [Expense], order: SortOrder) {
    match order {
        SortOrder::DateDesc => records.sort_by(|a, b| {
            (b.date, &b.created_at, &b.id).cmp(&(a.date, &a.created_at, &a.id))
        }),
        SortOrder::DateAsc => records.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)))
        }),
        SortOrder::CreatedDesc => {
            records.sort_by(|a, b| (&b.created_at, &b.id).cmp(&(&a.created_at, &a.id)))
        }
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, OutlayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Expense>, OutlayError> {
        let found = self
            .records
            .lock()
            .await
            .iter()
            .find(|e| e.idempotency_key.as_ref() == Some(key))
            .cloned();

        if let Some((barrier, parties)) = &self.rendezvous {
            if self.lookups.fetch_add(1, Ordering::SeqCst) < *parties {
                barrier.wait().await;
            }
        }
        Ok(found)
    }

    async fn insert(&self, expense: &Expense) -> Result<(), OutlayError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().await;

        if records.iter().any(|e| e.id == expense.id) {
            return Err(OutlayError::Storage {
                source: format!("duplicate record id {}", expense.id).into(),
            });
        }
        let key_taken = expense.idempotency_key.as_ref().is_some_and(|key| {
            records
                .iter()
                .any(|e| e.idempotency_key.as_ref() == Some(key))
        });
        if key_taken {
            return Err(OutlayError::DuplicateEntry {
                field: IDEMPOTENCY_KEY_FIELD.to_string(),
            });
        }

        records.push(expense.clone());
        Ok(())
    }

    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, OutlayError> {
        let mut expenses: Vec<Expense> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|e| query.category.as_deref().is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        sort_records(&mut expenses, query.sort);

        let total = expenses
            .iter()
            .try_fold(Amount::ZERO, |sum, e| sum.checked_add(e.amount))
            .ok_or_else(|| OutlayError::Internal("expense total overflowed".into()))?;
        Ok(ExpenseSummary {
            count: expenses.len(),
            total,
            expenses,
        })
    }
}
