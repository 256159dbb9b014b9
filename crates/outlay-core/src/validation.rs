// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field validation for incoming expense drafts.
//!
//! Every rule is evaluated and all violations are returned together, in
//! field order (amount, category, description, date).

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::OutlayError;
use crate::idempotency::IdempotencyKey;
use crate::types::{Amount, Expense, ExpenseDraft, timestamp_now};

/// Upper bounds applied by [`validate_draft`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseLimits {
    /// Largest accepted amount, in major units.
    pub max_amount: f64,
    /// Maximum category length in characters, after trimming.
    pub max_category_len: usize,
    /// Maximum description length in characters, after trimming.
    pub max_description_len: usize,
}

impl Default for ExpenseLimits {
    fn default() -> Self {
        Self {
            max_amount: 999_999_999.99,
            max_category_len: 100,
            max_description_len: 500,
        }
    }
}

/// An expense draft that passed validation, normalized and ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExpense {
    pub amount: Amount,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
}

impl ValidatedExpense {
    /// Builds a new record with a fresh id and server-assigned timestamps.
    pub fn into_expense(self, idempotency_key: Option<IdempotencyKey>) -> Expense {
        let now = timestamp_now();
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date,
            idempotency_key,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Validates a raw draft against `limits`, treating `today` as the latest
/// acceptable expense date.
pub fn validate_draft(
    draft: &ExpenseDraft,
    limits: &ExpenseLimits,
    today: NaiveDate,
) -> Result<ValidatedExpense, OutlayError> {
    let mut errors = Vec::new();

    let amount = check_amount(draft.amount.as_ref(), limits, &mut errors);
    let category = check_text(
        draft.category.as_ref(),
        "Category",
        limits.max_category_len,
        &mut errors,
    );
    let description = check_text(
        draft.description.as_ref(),
        "Description",
        limits.max_description_len,
        &mut errors,
    );
    let date = check_date(draft.date.as_ref(), today, &mut errors);

    match (amount, category, description, date) {
        (Some(amount), Some(category), Some(description), Some(date)) if errors.is_empty() => {
            Ok(ValidatedExpense {
                amount,
                category,
                description,
                date,
            })
        }
        _ => Err(OutlayError::Validation(errors)),
    }
}

fn check_amount(
    value: Option<&Value>,
    limits: &ExpenseLimits,
    errors: &mut Vec<String>,
) -> Option<Amount> {
    let number = match value {
        None | Some(Value::Null) => {
            errors.push("Amount is required".to_string());
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push("Amount is required".to_string());
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let Some(number) = number.filter(|n| n.is_finite()) else {
        errors.push("Amount must be a valid number".to_string());
        return None;
    };

    if number <= 0.0 {
        errors.push("Amount must be greater than 0".to_string());
        return None;
    }
    if number > limits.max_amount {
        errors.push("Amount exceeds maximum allowed value".to_string());
        return None;
    }
    match Amount::from_major(number) {
        Some(amount) if amount.cents() >= 1 => Some(amount),
        _ => {
            errors.push("Amount must be at least 0.01".to_string());
            None
        }
    }
}

fn check_text(
    value: Option<&Value>,
    label: &str,
    max_len: usize,
    errors: &mut Vec<String>,
) -> Option<String> {
    let Some(Value::String(raw)) = value else {
        errors.push(format!("{label} is required and must be a string"));
        return None;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push(format!("{label} cannot be empty"));
        return None;
    }
    if trimmed.chars().count() > max_len {
        errors.push(format!("{label} must be {max_len} characters or less"));
        return None;
    }
    Some(trimmed.to_string())
}

fn check_date(value: Option<&Value>, today: NaiveDate, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let raw = match value {
        None | Some(Value::Null) => {
            errors.push("Date is required".to_string());
            return None;
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push("Date is required".to_string());
            return None;
        }
        Some(Value::String(s)) => s.trim(),
        Some(_) => {
            errors.push("Date must be a valid date".to_string());
            return None;
        }
    };

    let Some(date) = parse_date(raw) else {
        errors.push("Date must be a valid date".to_string());
        return None;
    };
    if date > today {
        errors.push("Date cannot be in the future".to_string());
        return None;
    }
    Some(date)
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC calendar date).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc).date_naive())
    })
}
