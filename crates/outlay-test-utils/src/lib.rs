// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Outlay integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - the gateway on an ephemeral port over temp storage
//! - [`MemoryExpenseStore`] - in-memory store that can stage key races

pub mod harness;
pub mod memory_store;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::MemoryExpenseStore;
