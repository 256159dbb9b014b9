// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for draft validation.

use chrono::NaiveDate;
use outlay_core::{ExpenseDraft, ExpenseLimits, OutlayError, validate_draft};
use proptest::prelude::*;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

proptest! {
    #[test]
    fn in_range_cent_amounts_are_accepted_exactly(cents in 1i64..=99_999_999_999i64) {
        let draft = ExpenseDraft {
            amount: Some(json!(cents as f64 / 100.0)),
            category: Some(json!("Food")),
            description: Some(json!("Lunch")),
            date: Some(json!("2024-02-18")),
            idempotency_key: None,
        };
        let valid = validate_draft(&draft, &ExpenseLimits::default(), today()).unwrap();
        prop_assert_eq!(valid.amount.cents(), cents);
    }

    #[test]
    fn arbitrary_strings_never_panic(amount in ".*", category in ".*", date in ".*") {
        let draft = ExpenseDraft {
            amount: Some(json!(amount)),
            category: Some(json!(category)),
            description: Some(json!("x")),
            date: Some(json!(date)),
            idempotency_key: None,
        };
        match validate_draft(&draft, &ExpenseLimits::default(), today()) {
            Ok(_) => {}
            Err(OutlayError::Validation(msgs)) => prop_assert!(!msgs.is_empty()),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
