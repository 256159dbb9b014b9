// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` runs the real gateway on an ephemeral localhost port,
//! backed by a temp SQLite database or a [`MemoryExpenseStore`], and hands
//! out clients pointed at it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use outlay_client::{ClientError, ExpenseClient, FaultInjector, FaultyTransport, HttpTransport};
use outlay_config::model::{ClientConfig, StorageConfig};
use outlay_core::{ExpenseLimits, ExpenseStore, OutlayError};
use outlay_gateway::{GatewayState, serve};
use outlay_resilience::RetryPolicy;
use outlay_storage::SqliteExpenseStore;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::memory_store::MemoryExpenseStore;

enum Backend {
    Sqlite,
    Memory(Arc<MemoryExpenseStore>),
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    backend: Backend,
    limits: ExpenseLimits,
    policy: RetryPolicy,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            backend: Backend::Sqlite,
            limits: ExpenseLimits::default(),
            policy: RetryPolicy {
                max_retries: 3,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(80),
                backoff_multiplier: 2.0,
            },
        }
    }

    /// Serve from an in-memory store instead of SQLite.
    pub fn with_memory_store(mut self, store: Arc<MemoryExpenseStore>) -> Self {
        self.backend = Backend::Memory(store);
        self
    }

    pub fn with_limits(mut self, limits: ExpenseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Retry policy for clients handed out by the harness.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open the store, bind 127.0.0.1:0 and start serving.
    pub async fn build(self) -> Result<TestHarness, OutlayError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| OutlayError::Storage { source: e.into() })?;

        let store: Arc<dyn ExpenseStore> = match self.backend {
            Backend::Sqlite => {
                let store = SqliteExpenseStore::new(StorageConfig {
                    database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
                    wal_mode: true,
                });
                store.initialize().await?;
                Arc::new(store)
            }
            Backend::Memory(store) => store,
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| OutlayError::Internal(format!("failed to bind test listener: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| OutlayError::Internal(format!("no local address: {e}")))?;

        let shutdown = CancellationToken::new();
        let state = GatewayState::new(store.clone(), self.limits);
        let server = tokio::spawn(serve(listener, state, shutdown.clone()));
        tracing::debug!(%addr, store = store.name(), "test gateway started");

        Ok(TestHarness {
            addr,
            store,
            policy: self.policy,
            shutdown,
            server,
            _temp_dir: temp_dir,
        })
    }
}

/// A running gateway with its store.
pub struct TestHarness {
    addr: SocketAddr,
    /// The store behind the gateway.
    pub store: Arc<dyn ExpenseStore>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
    server: JoinHandle<Result<(), OutlayError>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// SQLite-backed harness with defaults.
    pub async fn start() -> Result<Self, OutlayError> {
        Self::builder().build().await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// API base URL including the `/api` prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url(),
            request_timeout_ms: 5_000,
        }
    }

    /// Client talking to this gateway with the harness retry policy.
    pub fn client(&self) -> Result<ExpenseClient, ClientError> {
        let transport = HttpTransport::new(&self.client_config())?;
        Ok(ExpenseClient::with_transport(
            Arc::new(transport),
            self.policy.clone(),
        ))
    }

    /// Like [`client`](Self::client), with failures injected by `injector`.
    pub fn faulty_client(
        &self,
        injector: impl FaultInjector + 'static,
    ) -> Result<ExpenseClient, ClientError> {
        let transport = FaultyTransport::new(HttpTransport::new(&self.client_config())?, injector);
        Ok(ExpenseClient::with_transport(
            Arc::new(transport),
            self.policy.clone(),
        ))
    }

    /// Stop the server and wait for it to drain.
    pub async fn shutdown(self) -> Result<(), OutlayError> {
        self.shutdown.cancel();
        self.server
            .await
            .map_err(|e| OutlayError::Internal(format!("server task failed: {e}")))?
    }
}
