// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the write path and its collaborators.

pub mod store;

pub use store::ExpenseStore;
