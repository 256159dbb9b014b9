// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expense insert, lookup, and listing.

use chrono::NaiveDate;
use outlay_core::{Amount, Expense, ExpenseQuery, ExpenseSummary, IdempotencyKey, OutlayError, SortOrder};
use rusqlite::{Row, params};

use crate::database::Database;

const COLUMNS: &str =
    "id, amount_cents, category, description, date, idempotency_key, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Insert a new expense.
///
/// A second record with the same idempotency key is rejected with
/// [`OutlayError::DuplicateEntry`]; callers use that to detect a lost race.
pub async fn insert_expense(db: &Database, expense: &Expense) -> Result<(), OutlayError> {
    let expense = expense.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!("INSERT INTO expenses ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    expense.id,
                    expense.amount.cents(),
                    expense.category,
                    expense.description,
                    expense.date.format(DATE_FORMAT).to_string(),
                    expense.idempotency_key.as_ref().map(|k| k.as_str().to_string()),
                    expense.created_at,
                    expense.updated_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(OutlayError::DuplicateEntry {
            field: outlay_core::IDEMPOTENCY_KEY_FIELD.to_string(),
        })
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Look up the record created with `key`.
pub async fn find_by_idempotency_key(
    db: &Database,
    key: &IdempotencyKey,
) -> Result<Option<Expense>, OutlayError> {
    let key = key.as_str().to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<ExpenseRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM expenses WHERE idempotency_key = ?1"
            ))?;
            match stmt.query_row(params![key], ExpenseRow::from_row) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    row.map(ExpenseRow::into_expense).transpose()
}

/// List expenses matching `query`, with their count and summed amount.
pub async fn list_expenses(
    db: &Database,
    query: &ExpenseQuery,
) -> Result<ExpenseSummary, OutlayError> {
    let category = query.category.clone();
    let order = order_clause(query.sort);
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<ExpenseRow>, rusqlite::Error> {
            let filter = if category.is_some() {
                "WHERE category = ?1"
            } else {
                ""
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM expenses {filter} ORDER BY {order}"
            ))?;
            let rows = match &category {
                Some(c) => stmt.query_map(params![c], ExpenseRow::from_row)?,
                None => stmt.query_map([], ExpenseRow::from_row)?,
            };
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let mut total = Amount::ZERO;
    let mut expenses = Vec::with_capacity(rows.len());
    for row in rows {
        let expense = row.into_expense()?;
        total = total
            .checked_add(expense.amount)
            .ok_or_else(|| OutlayError::Internal("expense total overflowed".to_string()))?;
        expenses.push(expense);
    }
    Ok(ExpenseSummary {
        count: expenses.len(),
        expenses,
        total,
    })
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::DateDesc => "date DESC, created_at DESC, id DESC",
        SortOrder::DateAsc => "date ASC, created_at DESC, id DESC",
        SortOrder::CreatedDesc => "created_at DESC, id DESC",
    }
}

/// Raw column values, converted to [`Expense`] outside the connection thread.
struct ExpenseRow {
    id: String,
    amount_cents: i64,
    category: String,
    description: String,
    date: String,
    idempotency_key: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ExpenseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            amount_cents: row.get(1)?,
            category: row.get(2)?,
            description: row.get(3)?,
            date: row.get(4)?,
            idempotency_key: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_expense(self) -> Result<Expense, OutlayError> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|e| {
            OutlayError::Internal(format!("expense {} has malformed date: {e}", self.id))
        })?;
        let idempotency_key = self
            .idempotency_key
            .as_deref()
            .map(IdempotencyKey::parse)
            .transpose()?;
        Ok(Expense {
            id: self.id,
            amount: Amount::from_cents(self.amount_cents),
            category: self.category,
            description: self.description,
            date,
            idempotency_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
