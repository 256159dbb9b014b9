// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrying client for the expense API.
//!
//! Every create retry carries the same idempotency key, so a request the
//! server already applied comes back as a replay instead of a duplicate.

use std::sync::Arc;

use outlay_config::OutlayConfig;
use outlay_core::{CreateOutcome, ExpenseQuery, ExpenseSummary, IdempotencyKey, NewExpense};
use outlay_resilience::{RetryEngine, RetryNotice, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::transport::{HealthReport, HttpTransport, Transport};

/// Expense API client with retry and backoff.
#[derive(Clone)]
pub struct ExpenseClient {
    transport: Arc<dyn Transport>,
    engine: RetryEngine,
}

impl ExpenseClient {
    /// HTTP client configured from the `[client]` and `[retry]` sections.
    pub fn new(config: &OutlayConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config.client)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            RetryPolicy::from(&config.retry),
        ))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            engine: RetryEngine::new(policy),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.engine.policy()
    }

    /// One create request, no retry.
    pub async fn create_expense_once(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
    ) -> Result<CreateOutcome, ClientError> {
        self.transport.create(expense, key).await
    }

    /// Create `expense`, retrying transient failures with `key` on every
    /// attempt.
    ///
    /// `observer` sees each scheduled retry. Cancelling `cancel` returns
    /// [`ClientError::Cancelled`] and sends nothing further.
    pub async fn create_expense<O>(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
        cancel: &CancellationToken,
        observer: O,
    ) -> Result<CreateOutcome, ClientError>
    where
        O: FnMut(&RetryNotice<'_, ClientError>),
    {
        let transport = &self.transport;
        let outcome = self
            .engine
            .run(cancel, observer, move |attempt| async move {
                debug!(attempt, key = %key, "sending create request");
                transport.create(expense, key).await
            })
            .await?;

        info!(
            id = %outcome.expense.id,
            key = %key,
            replayed = outcome.replayed,
            "expense submitted"
        );
        Ok(outcome)
    }

    /// Fetch the expense list, retrying transient failures.
    pub async fn list_expenses(
        &self,
        query: &ExpenseQuery,
        cancel: &CancellationToken,
    ) -> Result<ExpenseSummary, ClientError> {
        let transport = &self.transport;
        self.engine
            .run(cancel, |_| {}, move |_| async move { transport.list(query).await })
            .await
    }

    /// Single health check, no retry.
    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.transport.health().await
    }
}
