// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Outlay expense tracker.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-connection concurrency model via `tokio-rusqlite`. The unique
//! index on `idempotency_key` is what makes concurrent same-key creates safe.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteExpenseStore;
pub use database::Database;
