// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deliberate failures for exercising retry and idempotency end to end.
//!
//! A [`FaultInjector`] decides, per request, whether to fail it and how.
//! [`FaultyTransport`] consults the injector before (or, for
//! [`FaultKind::ResponseLost`], after) delegating to the real transport.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use outlay_core::{CreateOutcome, ExpenseQuery, ExpenseSummary, IdempotencyKey, NewExpense};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::ClientError;
use crate::transport::{HealthReport, Transport};

/// How an injected failure presents itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The request times out before reaching the server.
    Timeout,
    /// The connection fails before reaching the server.
    Network,
    /// The server answers 500.
    ServerError,
    /// The server applies the request but the response never arrives.
    ResponseLost,
}

impl FaultKind {
    fn into_error(self) -> ClientError {
        match self {
            FaultKind::Timeout | FaultKind::ResponseLost => ClientError::Timeout,
            FaultKind::Network => ClientError::Network("connection reset (injected)".into()),
            FaultKind::ServerError => ClientError::Http {
                status: 500,
                code: None,
                message: "Injected server error".into(),
                errors: Vec::new(),
            },
        }
    }
}

/// Per-request failure strategy.
pub trait FaultInjector: Send + Sync {
    /// Decide the fate of the next request. `None` lets it through.
    fn next_fault(&self) -> Option<FaultKind>;

    /// Extra latency added to every request.
    fn delay(&self) -> Duration {
        Duration::ZERO
    }
}

impl<F: FaultInjector + ?Sized> FaultInjector for Arc<F> {
    fn next_fault(&self) -> Option<FaultKind> {
        (**self).next_fault()
    }

    fn delay(&self) -> Duration {
        (**self).delay()
    }
}

/// Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaults;

impl FaultInjector for NoFaults {
    fn next_fault(&self) -> Option<FaultKind> {
        None
    }
}

/// Fails the next `count` requests with `kind`, then lets everything through.
#[derive(Debug)]
pub struct ScriptedFaults {
    kind: FaultKind,
    remaining: AtomicU32,
    delay: Duration,
}

impl ScriptedFaults {
    pub fn new(kind: FaultKind, count: u32) -> Self {
        Self {
            kind,
            remaining: AtomicU32::new(count),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Failures still to be injected.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }
}

impl FaultInjector for ScriptedFaults {
    fn next_fault(&self) -> Option<FaultKind> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| self.kind)
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}

/// Fails each request independently with probability `rate`.
#[derive(Debug)]
pub struct RandomFaults {
    kind: FaultKind,
    rate: f64,
    delay: Duration,
    rng: Mutex<StdRng>,
}

impl RandomFaults {
    /// `rate` is clamped to `0.0..=1.0`.
    pub fn new(kind: FaultKind, rate: f64) -> Self {
        Self::with_rng(kind, rate, StdRng::from_entropy())
    }

    /// Reproducible sequence for tests.
    pub fn seeded(kind: FaultKind, rate: f64, seed: u64) -> Self {
        Self::with_rng(kind, rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(kind: FaultKind, rate: f64, rng: StdRng) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self {
            kind,
            rate,
            delay: Duration::ZERO,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FaultInjector for RandomFaults {
    fn next_fault(&self) -> Option<FaultKind> {
        let hit = match self.rng.lock() {
            Ok(mut rng) => rng.gen_bool(self.rate),
            Err(poisoned) => poisoned.into_inner().gen_bool(self.rate),
        };
        hit.then_some(self.kind)
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}

/// A [`Transport`] that fails on the injector's say-so.
pub struct FaultyTransport<T> {
    inner: T,
    injector: Box<dyn FaultInjector>,
}

impl<T: Transport> FaultyTransport<T> {
    pub fn new(inner: T, injector: impl FaultInjector + 'static) -> Self {
        Self {
            inner,
            injector: Box::new(injector),
        }
    }

    /// Apply latency and decide the fault for one request.
    async fn before(&self, operation: &'static str) -> Result<Option<FaultKind>, ClientError> {
        let delay = self.injector.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.injector.next_fault() {
            Some(FaultKind::ResponseLost) => {
                debug!(operation, "injecting lost response");
                Ok(Some(FaultKind::ResponseLost))
            }
            Some(kind) => {
                debug!(operation, ?kind, "injecting fault");
                Err(kind.into_error())
            }
            None => Ok(None),
        }
    }
}

/// Swap the real result for the fault's error when the response is lost.
fn after<R>(fault: Option<FaultKind>, result: Result<R, ClientError>) -> Result<R, ClientError> {
    match fault {
        Some(kind) => Err(kind.into_error()),
        None => result,
    }
}

#[async_trait]
impl<T: Transport> Transport for FaultyTransport<T> {
    async fn create(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
    ) -> Result<CreateOutcome, ClientError> {
        let fault = self.before("create").await?;
        after(fault, self.inner.create(expense, key).await)
    }

    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, ClientError> {
        let fault = self.before("list").await?;
        after(fault, self.inner.list(query).await)
    }

    async fn health(&self) -> Result<HealthReport, ClientError> {
        let fault = self.before("health").await?;
        after(fault, self.inner.health().await)
    }
}
