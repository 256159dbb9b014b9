// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ExpenseStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use outlay_config::model::StorageConfig;
use outlay_core::{
    Expense, ExpenseQuery, ExpenseStore, ExpenseSummary, HealthStatus, IdempotencyKey, OutlayError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed expense store.
///
/// The database is opened lazily by [`SqliteExpenseStore::initialize`];
/// every other operation fails until then.
pub struct SqliteExpenseStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteExpenseStore {
    /// Create a store for the configured database path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database.
    pub fn with_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), OutlayError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| OutlayError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite expense store initialized");
        Ok(())
    }

    /// Checkpoint the WAL. The connection itself closes on drop.
    pub async fn close(&self) -> Result<(), OutlayError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    fn db(&self) -> Result<&Database, OutlayError> {
        self.db.get().ok_or_else(|| OutlayError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ExpenseStore for SqliteExpenseStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<HealthStatus, OutlayError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        let ping = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Expense>, OutlayError> {
        queries::expenses::find_by_idempotency_key(self.db()?, key).await
    }

    async fn insert(&self, expense: &Expense) -> Result<(), OutlayError> {
        queries::expenses::insert_expense(self.db()?, expense).await
    }

    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, OutlayError> {
        queries::expenses::list_expenses(self.db()?, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let store = SqliteExpenseStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        let err = store.list(&ExpenseQuery::default()).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let store = SqliteExpenseStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = SqliteExpenseStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn in_memory_store_is_ready() {
        let store = SqliteExpenseStore::with_database(Database::open_in_memory().await.unwrap());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(store.list(&ExpenseQuery::default()).await.unwrap().count, 0);
    }
}
