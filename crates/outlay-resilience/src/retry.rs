// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retry loop.
//!
//! An attempt that fails with a transient error is retried after the
//! policy's delay, up to `max_retries` times. Anything else (success, a
//! permanent error, cancellation, exhaustion) ends the loop immediately and
//! the final error is returned unchanged.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::policy::RetryPolicy;

/// Errors that know whether another attempt could succeed.
pub trait RetryableError: std::error::Error + Send + Sized {
    /// `true` for failures worth retrying (network, timeout, 408/429/5xx).
    fn is_transient(&self) -> bool;

    /// `true` if this value is the cancellation marker.
    fn is_cancelled(&self) -> bool;

    /// The value returned when the caller cancels the operation.
    fn cancelled() -> Self;
}

/// Passed to the observer before each backoff wait.
#[derive(Debug)]
pub struct RetryNotice<'a, E> {
    /// The retry about to be made, starting at 1.
    pub attempt: u32,
    pub max_retries: u32,
    /// How long the engine will wait before that retry.
    pub delay: Duration,
    /// The failure that triggered the retry.
    pub error: &'a E,
}

/// Progress of one `run` call. Dropped when the call returns.
#[derive(Debug)]
pub(crate) struct RetryState<E> {
    attempt: u32,
    delay: Duration,
    last_error: Option<E>,
}

impl<E> RetryState<E> {
    fn new(initial_delay: Duration) -> Self {
        Self {
            attempt: 0,
            delay: initial_delay,
            last_error: None,
        }
    }

    /// Remember the failure that is about to be retried after `delay`.
    fn record_retry(&mut self, delay: Duration, error: E) {
        self.delay = delay;
        self.last_error = Some(error);
    }
}

/// Runs actions under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryEngine {
    policy: RetryPolicy,
}

impl RetryEngine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `action` until it succeeds, fails permanently, the retry
    /// budget runs out, or `cancel` fires.
    ///
    /// `action` receives the 1-based attempt number. `observer` is called
    /// once per retry, before the wait. On cancellation the result is
    /// `Err(E::cancelled())` and `action` is never invoked again.
    pub async fn run<T, E, F, Fut, O>(
        &self,
        cancel: &CancellationToken,
        mut observer: O,
        mut action: F,
    ) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(&RetryNotice<'_, E>),
    {
        let mut state = RetryState::new(self.policy.initial_delay);

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(&state));
            }
            state.attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&state)),
                outcome = action(state.attempt) => outcome,
            };

            let error = match outcome {
                Ok(value) => {
                    if state.attempt > 1 {
                        debug!(attempts = state.attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if error.is_cancelled() {
                debug!(attempt = state.attempt, "action reported cancellation");
                return Err(error);
            }
            if !error.is_transient() {
                debug!(attempt = state.attempt, error = %error, "permanent failure, not retrying");
                return Err(error);
            }
            if state.attempt > self.policy.max_retries {
                warn!(
                    attempts = state.attempt,
                    error = %error,
                    "retry budget exhausted"
                );
                return Err(error);
            }

            let retry = state.attempt;
            let delay = self.policy.delay_for_retry(retry);
            observer(&RetryNotice {
                attempt: retry,
                max_retries: self.policy.max_retries,
                delay,
                error: &error,
            });
            warn!(
                attempt = retry,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient failure, will retry"
            );
            state.record_retry(delay, error);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&state)),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

fn cancelled<E: RetryableError>(state: &RetryState<E>) -> E {
    match &state.last_error {
        Some(last) => debug!(
            attempt = state.attempt,
            delay_ms = state.delay.as_millis() as u64,
            last_error = %last,
            "retry loop cancelled"
        ),
        None => debug!(attempt = state.attempt, "retry loop cancelled"),
    }
    E::cancelled()
}
