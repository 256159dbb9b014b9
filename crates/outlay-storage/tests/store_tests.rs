// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for SqliteExpenseStore through the ExpenseStore trait.

use std::sync::Arc;

use chrono::NaiveDate;
use outlay_config::model::StorageConfig;
use outlay_core::{
    Amount, ExpenseLimits, ExpenseQuery, ExpenseStore, IdempotencyKey, NewExpense, OutlayError,
    validate_draft,
};
use outlay_storage::SqliteExpenseStore;

fn new_expense(key: Option<&str>) -> outlay_core::Expense {
    let draft = (&NewExpense {
        amount: 1500.0,
        category: "Food".into(),
        description: "Lunch".into(),
        date: "2024-02-18".into(),
    })
        .into();
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    validate_draft(&draft, &ExpenseLimits::default(), today)
        .unwrap()
        .into_expense(key.map(|k| IdempotencyKey::parse(k).unwrap()))
}

async fn file_store(dir: &tempfile::TempDir) -> SqliteExpenseStore {
    let path = dir.path().join("outlay.db");
    let store = SqliteExpenseStore::new(StorageConfig {
        database_path: path.to_str().unwrap().to_string(),
        wal_mode: true,
    });
    store.initialize().await.unwrap();
    store
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let expense = new_expense(Some("abc-123"));
    {
        let store = file_store(&dir).await;
        store.insert(&expense).await.unwrap();
        store.close().await.unwrap();
    }

    let store = file_store(&dir).await;
    let key = IdempotencyKey::parse("abc-123").unwrap();
    let found = store.find_by_idempotency_key(&key).await.unwrap().unwrap();
    assert_eq!(found, expense);
    assert_eq!(found.amount, Amount::from_cents(150_000));
}

#[tokio::test]
async fn concurrent_same_key_inserts_leave_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ExpenseStore> = Arc::new(file_store(&dir).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.insert(&new_expense(Some("race-key"))).await
        }));
    }

    let mut ok = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(OutlayError::DuplicateEntry { .. }) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((ok, duplicates), (1, 7));
    assert_eq!(store.list(&ExpenseQuery::default()).await.unwrap().count, 1);
}

#[tokio::test]
async fn keyless_inserts_always_create() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir).await;
    store.insert(&new_expense(None)).await.unwrap();
    store.insert(&new_expense(None)).await.unwrap();

    let summary = store.list(&ExpenseQuery::default()).await.unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, Amount::from_cents(300_000));
    assert!(summary.expenses.iter().all(|e| e.idempotency_key.is_none()));
}
