// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the store trait, the write path, and the HTTP API.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::OutlayError;
use crate::idempotency::IdempotencyKey;

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is operational but experiencing issues.
    Degraded(String),
    /// Store is not operational.
    Unhealthy(String),
}

/// A monetary amount held as integer minor units (cents).
///
/// On the wire it is a plain JSON number in major units, so `1500.5`
/// round-trips as 150050 cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a major-unit value, rounding to the nearest cent.
    /// Returns `None` for non-finite or out-of-range input.
    pub fn from_major(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::from_major(value)
            .ok_or_else(|| serde::de::Error::custom(format!("amount {value} is out of range")))
    }
}

/// A persisted expense record.
///
/// Owned by the server-side store once persisted; clients hold read copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Record identifier (UUID v4).
    pub id: String,
    pub amount: Amount,
    pub category: String,
    pub description: String,
    /// Calendar date the expense occurred.
    pub date: NaiveDate,
    /// Deduplication key, unique across records when present.
    #[serde(default)]
    pub idempotency_key: Option<IdempotencyKey>,
    /// ISO 8601 timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp.
    pub updated_at: String,
}

/// Typed creation payload sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: String,
}

/// Untyped creation payload as received by the server.
///
/// Every field is kept as raw JSON so validation can report all problems at
/// once instead of failing on the first type mismatch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    #[serde(default)]
    pub date: Option<serde_json::Value>,
    /// Fallback location for the idempotency key.
    #[serde(default)]
    pub idempotency_key: Option<serde_json::Value>,
}

impl From<&NewExpense> for ExpenseDraft {
    fn from(new: &NewExpense) -> Self {
        Self {
            amount: Some(serde_json::json!(new.amount)),
            category: Some(serde_json::Value::String(new.category.clone())),
            description: Some(serde_json::Value::String(new.description.clone())),
            date: Some(serde_json::Value::String(new.date.clone())),
            idempotency_key: None,
        }
    }
}

/// Result of a create request on the write path.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub expense: Expense,
    /// `true` when the record already existed for the supplied key.
    pub replayed: bool,
}

impl CreateOutcome {
    pub fn created(expense: Expense) -> Self {
        Self {
            expense,
            replayed: false,
        }
    }

    pub fn replayed(expense: Expense) -> Self {
        Self {
            expense,
            replayed: true,
        }
    }
}

/// Sort selector for listing expenses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recent expense date first.
    #[default]
    DateDesc,
    /// Oldest expense date first.
    DateAsc,
    /// Most recently created record first.
    CreatedDesc,
}

/// Filter and ordering for a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    /// Exact category match.
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl ExpenseQuery {
    /// Builds a query from raw query-string parameters.
    ///
    /// An absent parameter means "no filter"/"default order"; a present but
    /// blank category or an unknown sort selector is rejected.
    pub fn from_params(category: Option<&str>, sort: Option<&str>) -> Result<Self, OutlayError> {
        let category = match category {
            None => None,
            Some(c) if c.trim().is_empty() => {
                return Err(OutlayError::InvalidFilter(
                    "Category filter must be a non-empty string".to_string(),
                ));
            }
            Some(c) => Some(c.to_string()),
        };
        let sort = match sort {
            None => SortOrder::default(),
            Some(s) => SortOrder::from_str(s).map_err(|_| {
                OutlayError::InvalidFilter(format!(
                    "Unknown sort `{s}`; expected one of date_desc, date_asc, created_desc"
                ))
            })?,
        };
        Ok(Self { category, sort })
    }
}

/// Records matching a list query, with their count and summed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub expenses: Vec<Expense>,
    pub total: Amount,
    pub count: usize,
}

/// Current UTC time in the millisecond ISO 8601 form used for record timestamps.
pub fn timestamp_now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_rounds_to_cents() {
        assert_eq!(Amount::from_major(1500.0).unwrap().cents(), 150_000);
        assert_eq!(Amount::from_major(0.126).unwrap().cents(), 13);
        assert_eq!(Amount::from_major(12.34).unwrap().cents(), 1234);
        assert!(Amount::from_major(f64::NAN).is_none());
        assert!(Amount::from_major(f64::INFINITY).is_none());
    }

    #[test]
    fn amount_displays_two_decimals() {
        assert_eq!(Amount::from_cents(150_000).to_string(), "1500.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-250).to_string(), "-2.50");
    }

    #[test]
    fn amount_serializes_as_major_units() {
        let json = serde_json::to_string(&Amount::from_cents(150_050)).unwrap();
        assert_eq!(json, "1500.5");
        let back: Amount = serde_json::from_str("1500.5").unwrap();
        assert_eq!(back.cents(), 150_050);
        let int: Amount = serde_json::from_str("1500").unwrap();
        assert_eq!(int.cents(), 150_000);
    }

    #[test]
    fn expense_uses_camel_case_on_the_wire() {
        let expense = Expense {
            id: "e-1".into(),
            amount: Amount::from_cents(150_000),
            category: "Food".into(),
            description: "Lunch".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 18).unwrap(),
            idempotency_key: Some(IdempotencyKey::parse("abc-123").unwrap()),
            created_at: "2024-02-18T10:30:00.000Z".into(),
            updated_at: "2024-02-18T10:30:00.000Z".into(),
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["idempotencyKey"], "abc-123");
        assert_eq!(value["date"], "2024-02-18");
        assert_eq!(value["createdAt"], "2024-02-18T10:30:00.000Z");
        assert_eq!(value["amount"], 1500.0);

        let back: Expense = serde_json::from_value(value).unwrap();
        assert_eq!(back, expense);
    }

    #[test]
    fn expense_with_blank_key_is_rejected_on_decode() {
        let mut value = serde_json::json!({
            "id": "e-1",
            "amount": 12.5,
            "category": "Food",
            "description": "Lunch",
            "date": "2024-02-18",
            "idempotencyKey": "   ",
            "createdAt": "2024-02-18T10:30:00.000Z",
            "updatedAt": "2024-02-18T10:30:00.000Z"
        });
        assert!(serde_json::from_value::<Expense>(value.clone()).is_err());

        value["idempotencyKey"] = serde_json::Value::Null;
        let keyless: Expense = serde_json::from_value(value).unwrap();
        assert!(keyless.idempotency_key.is_none());
    }

    #[test]
    fn draft_keeps_raw_values() {
        let draft: ExpenseDraft = serde_json::from_str(
            r#"{"amount": "12.5", "category": 7, "date": null, "idempotencyKey": "k"}"#,
        )
        .unwrap();
        assert_eq!(draft.amount, Some(serde_json::json!("12.5")));
        assert_eq!(draft.category, Some(serde_json::json!(7)));
        assert!(draft.description.is_none());
        assert!(draft.date.is_none());
        assert_eq!(draft.idempotency_key, Some(serde_json::json!("k")));
    }

    #[test]
    fn query_defaults_to_date_desc() {
        let query = ExpenseQuery::from_params(None, None).unwrap();
        assert_eq!(query, ExpenseQuery::default());
        assert_eq!(query.sort, SortOrder::DateDesc);
    }

    #[test]
    fn query_parses_all_sort_selectors() {
        for (raw, expected) in [
            ("date_desc", SortOrder::DateDesc),
            ("date_asc", SortOrder::DateAsc),
            ("created_desc", SortOrder::CreatedDesc),
        ] {
            let query = ExpenseQuery::from_params(Some("Food"), Some(raw)).unwrap();
            assert_eq!(query.sort, expected);
            assert_eq!(query.category.as_deref(), Some("Food"));
            assert_eq!(expected.to_string(), raw);
        }
    }

    #[test]
    fn query_rejects_blank_category_and_unknown_sort() {
        assert!(matches!(
            ExpenseQuery::from_params(Some("  "), None),
            Err(OutlayError::InvalidFilter(_))
        ));
        assert!(matches!(
            ExpenseQuery::from_params(None, Some("amount_desc")),
            Err(OutlayError::InvalidFilter(_))
        ));
    }

    #[test]
    fn timestamp_has_millisecond_utc_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 24, "{ts}");
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
