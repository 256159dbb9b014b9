// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with exponential backoff for Outlay client calls.
//!
//! [`RetryEngine`] re-invokes an async action while it fails with a
//! transient [`RetryableError`], sleeping between attempts according to a
//! deterministic [`RetryPolicy`]. A [`CancellationToken`] stops the loop
//! before, during, or between attempts.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod policy;
pub mod retry;

pub use policy::RetryPolicy;
pub use retry::{RetryEngine, RetryNotice, RetryableError};
