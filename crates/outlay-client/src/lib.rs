// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client library for the Outlay expense API.
//!
//! [`ExpenseClient`] wraps a [`Transport`] with retry and backoff, sending
//! the same idempotency key on every retry of a create.
//! [`SubmissionController`] adds single-flight and debounce guards on top
//! for interactive callers. [`FaultyTransport`] injects failures for
//! testing the whole path.

pub mod client;
pub mod error;
pub mod fault;
pub mod submission;
pub mod transport;

pub use client::ExpenseClient;
pub use error::{ClientError, is_transient_status};
pub use fault::{FaultInjector, FaultKind, FaultyTransport, NoFaults, RandomFaults, ScriptedFaults};
pub use submission::{Settlement, SubmissionController, SubmissionState, SubmitError};
pub use transport::{HealthReport, HttpTransport, Transport};
