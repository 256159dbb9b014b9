// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guarded expense submission.
//!
//! [`SubmissionController`] allows one submission in flight at a time,
//! rejects submissions that follow the previous one too closely, and
//! publishes progress on a [`watch`] channel so a UI or CLI can render it.
//! Each submission gets a fresh idempotency key that is reused for all of
//! its retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use outlay_config::model::SubmissionConfig;
use outlay_core::{CreateOutcome, IdempotencyKey, NewExpense};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ExpenseClient;
use crate::error::ClientError;

/// What the controller is doing right now.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    /// First attempt in flight.
    Submitting,
    /// Waiting `delay` before retry number `attempt`.
    Retrying {
        attempt: u32,
        max_retries: u32,
        delay: Duration,
    },
    Settled(Settlement),
}

/// How the last submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Succeeded { expense_id: String, replayed: bool },
    /// Only reached once retries are exhausted or the error is permanent.
    Failed { message: String, attempts: u32 },
    Cancelled,
}

/// Why [`SubmissionController::submit`] did not produce a record.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    InProgress,

    #[error("submitted too soon after the previous submission; wait {remaining:?}")]
    Debounced { remaining: Duration },

    #[error("submission cancelled")]
    Cancelled,

    #[error("submission failed after {attempts} attempt(s): {source}")]
    Failed {
        #[source]
        source: ClientError,
        attempts: u32,
    },
}

#[derive(Default)]
struct Slot {
    last_started: Option<Instant>,
    token: Option<CancellationToken>,
}

/// Clears the in-flight flag however the submission future ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight, debounced expense submission.
pub struct SubmissionController {
    client: ExpenseClient,
    debounce: Duration,
    in_flight: AtomicBool,
    slot: Mutex<Slot>,
    state: watch::Sender<SubmissionState>,
}

impl SubmissionController {
    pub fn new(client: ExpenseClient, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            client,
            debounce,
            in_flight: AtomicBool::new(false),
            slot: Mutex::new(Slot::default()),
            state,
        }
    }

    pub fn from_config(client: ExpenseClient, config: &SubmissionConfig) -> Self {
        Self::new(client, config.debounce())
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submit `expense` under a new idempotency key, retrying transient
    /// failures.
    pub async fn submit(&self, expense: &NewExpense) -> Result<CreateOutcome, SubmitError> {
        let token = self.begin().await?;
        let _in_flight = InFlight(&self.in_flight);

        let key = IdempotencyKey::generate();
        debug!(key = %key, "submission started");
        self.state.send_replace(SubmissionState::Submitting);

        let mut retries = 0;
        let result = self
            .client
            .create_expense(expense, &key, &token, |notice| {
                retries = notice.attempt;
                self.state.send_replace(SubmissionState::Retrying {
                    attempt: notice.attempt,
                    max_retries: notice.max_retries,
                    delay: notice.delay,
                });
            })
            .await;
        let attempts = retries + 1;

        match result {
            Ok(outcome) => {
                self.settle(Settlement::Succeeded {
                    expense_id: outcome.expense.id.clone(),
                    replayed: outcome.replayed,
                });
                Ok(outcome)
            }
            Err(ClientError::Cancelled) => {
                info!(key = %key, attempts, "submission cancelled");
                self.settle(Settlement::Cancelled);
                Err(SubmitError::Cancelled)
            }
            Err(source) => {
                warn!(key = %key, attempts, error = %source, "submission failed");
                self.settle(Settlement::Failed {
                    message: source.to_string(),
                    attempts,
                });
                Err(SubmitError::Failed { source, attempts })
            }
        }
    }

    /// Cancel the in-flight submission, if any. Returns whether one was
    /// running.
    pub async fn cancel(&self) -> bool {
        let slot = self.slot.lock().await;
        match &slot.token {
            Some(token) if self.is_submitting() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Return a settled controller to `Idle`. Does nothing while a
    /// submission is in flight.
    pub fn reset(&self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.state.send_replace(SubmissionState::Idle);
        true
    }

    /// Claim the controller for a new submission.
    async fn begin(&self) -> Result<CancellationToken, SubmitError> {
        let mut slot = self.slot.lock().await;

        if self.in_flight.load(Ordering::SeqCst) {
            warn!("submission rejected: another one is in progress");
            return Err(SubmitError::InProgress);
        }

        let now = Instant::now();
        if let Some(last) = slot.last_started {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.debounce {
                let remaining = self.debounce - elapsed;
                warn!(remaining_ms = remaining.as_millis() as u64, "submission debounced");
                return Err(SubmitError::Debounced { remaining });
            }
        }
        slot.last_started = Some(now);

        if let Some(previous) = slot.token.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        self.in_flight.store(true, Ordering::SeqCst);
        Ok(token)
    }

    fn settle(&self, settlement: Settlement) {
        self.state.send_replace(SubmissionState::Settled(settlement));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use outlay_core::{Amount, Expense, ExpenseQuery, ExpenseSummary};
    use outlay_resilience::RetryPolicy;

    use crate::transport::{HealthReport, Transport};

    /// Fails the first `failures` creates with `error`, then succeeds.
    /// Records the key of every create it sees.
    struct Scripted {
        failures: StdMutex<u32>,
        error: ClientError,
        latency: Duration,
        keys: StdMutex<Vec<String>>,
    }

    impl Scripted {
        fn new(failures: u32, error: ClientError) -> Arc<Self> {
            Arc::new(Self {
                failures: StdMutex::new(failures),
                error,
                latency: Duration::from_millis(50),
                keys: StdMutex::new(Vec::new()),
            })
        }

        fn keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn create(
            &self,
            expense: &NewExpense,
            key: &IdempotencyKey,
        ) -> Result<CreateOutcome, ClientError> {
            self.keys.lock().unwrap().push(key.to_string());
            tokio::time::sleep(self.latency).await;
            {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(self.error.clone());
                }
            }
            Ok(CreateOutcome::created(Expense {
                id: format!("id-{key}"),
                amount: Amount::from_major(expense.amount).unwrap(),
                category: expense.category.clone(),
                description: expense.description.clone(),
                date: expense.date.parse().unwrap(),
                idempotency_key: Some(key.clone()),
                created_at: "2024-02-18T10:30:00.000Z".into(),
                updated_at: "2024-02-18T10:30:00.000Z".into(),
            }))
        }

        async fn list(&self, _query: &ExpenseQuery) -> Result<ExpenseSummary, ClientError> {
            unreachable!("submission never lists")
        }

        async fn health(&self) -> Result<HealthReport, ClientError> {
            unreachable!("submission never checks health")
        }
    }

    fn controller(transport: Arc<Scripted>) -> SubmissionController {
        let client = ExpenseClient::with_transport(transport, RetryPolicy::default());
        SubmissionController::new(client, Duration::from_millis(300))
    }

    fn lunch() -> NewExpense {
        NewExpense {
            amount: 1500.0,
            category: "Food".into(),
            description: "Lunch".into(),
            date: "2024-02-18".into(),
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Http {
            status: 503,
            code: None,
            message: "unavailable".into(),
            errors: Vec::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_reuse_one_key_and_report_progress() {
        let transport = Scripted::new(2, unavailable());
        let controller = controller(transport.clone());
        let mut rx = controller.subscribe();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let done = matches!(state, SubmissionState::Settled(_));
                seen.push(state);
                if done {
                    break;
                }
            }
            seen
        });

        let outcome = controller.submit(&lunch()).await.unwrap();
        assert!(!outcome.replayed);

        let keys = transport.keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| k == &keys[0]));
        assert_eq!(outcome.expense.id, format!("id-{}", keys[0]));

        let seen = watcher.await.unwrap();
        assert_eq!(
            seen,
            vec![
                SubmissionState::Submitting,
                SubmissionState::Retrying {
                    attempt: 1,
                    max_retries: 3,
                    delay: Duration::from_millis(1000)
                },
                SubmissionState::Retrying {
                    attempt: 2,
                    max_retries: 3,
                    delay: Duration::from_millis(2000)
                },
                SubmissionState::Settled(Settlement::Succeeded {
                    expense_id: outcome.expense.id.clone(),
                    replayed: false
                }),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_in_flight_is_rejected() {
        let transport = Scripted::new(0, unavailable());
        let controller = Arc::new(controller(transport.clone()));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit(&lunch()).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_submitting());

        // Also inside the debounce window; the in-flight check runs first.
        let err = controller.submit(&lunch()).await.unwrap_err();
        assert!(matches!(err, SubmitError::InProgress));

        first.await.unwrap().unwrap();
        assert!(!controller.is_submitting());
        assert_eq!(transport.keys().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_resubmit_is_debounced() {
        let transport = Scripted::new(0, unavailable());
        let controller = controller(transport.clone());
        controller.submit(&lunch()).await.unwrap();

        // 50 ms of latency elapsed; the window is 300 ms from the start.
        let err = controller.submit(&lunch()).await.unwrap_err();
        assert!(
            matches!(err, SubmitError::Debounced { remaining } if remaining == Duration::from_millis(250))
        );

        tokio::time::sleep(Duration::from_millis(250)).await;
        controller.submit(&lunch()).await.unwrap();

        let keys = transport.keys();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_settles_after_one_attempt() {
        let transport = Scripted::new(
            1,
            ClientError::Http {
                status: 400,
                code: None,
                message: "Validation failed".into(),
                errors: vec!["Amount must be greater than 0".into()],
            },
        );
        let controller = controller(transport.clone());

        let err = controller.submit(&lunch()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Failed { attempts: 1, .. }));
        assert_eq!(
            controller.state(),
            SubmissionState::Settled(Settlement::Failed {
                message: "server returned 400: Validation failed".into(),
                attempts: 1
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_every_attempt() {
        let transport = Scripted::new(10, ClientError::Timeout);
        let controller = controller(transport.clone());

        let err = controller.submit(&lunch()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Failed { attempts: 4, source: ClientError::Timeout }));
        assert_eq!(transport.keys().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_settles_as_cancelled() {
        let transport = Scripted::new(10, unavailable());
        let controller = Arc::new(controller(transport.clone()));

        let running = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit(&lunch()).await }
        });

        // First attempt fails at 50 ms; the 1000 ms backoff is underway.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(controller.cancel().await);

        let err = running.await.unwrap().unwrap_err();
        assert!(matches!(err, SubmitError::Cancelled));
        assert_eq!(controller.state(), SubmissionState::Settled(Settlement::Cancelled));
        assert_eq!(transport.keys().len(), 1);
        assert!(!controller.cancel().await);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_returns_to_idle_only_when_settled() {
        let transport = Scripted::new(0, unavailable());
        let controller = Arc::new(controller(transport));

        let running = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit(&lunch()).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!controller.reset());
        assert_eq!(controller.state(), SubmissionState::Submitting);

        running.await.unwrap().unwrap();
        assert!(controller.reset());
        assert_eq!(controller.state(), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn controllers_do_not_share_state() {
        let transport = Scripted::new(0, unavailable());
        let a = controller(transport.clone());
        let b = controller(transport.clone());

        a.submit(&lunch()).await.unwrap();
        // `a` is inside its debounce window; `b` is not affected.
        assert!(matches!(a.submit(&lunch()).await, Err(SubmitError::Debounced { .. })));
        b.submit(&lunch()).await.unwrap();
        assert_eq!(transport.keys().len(), 2);
    }
}
