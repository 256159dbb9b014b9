// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the expense API.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use outlay_config::model::ServerConfig;
use outlay_core::{ExpenseLimits, ExpenseStore, OutlayError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::gate::IdempotencyGate;
use crate::handlers;
use crate::service::ExpenseWriteService;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn ExpenseStore>,
    pub gate: IdempotencyGate,
    pub writer: ExpenseWriteService,
    /// Process start, for reported uptime.
    pub started: Instant,
}

impl GatewayState {
    /// Wire the gate and write service to one store.
    pub fn new(store: Arc<dyn ExpenseStore>, limits: ExpenseLimits) -> Self {
        Self {
            gate: IdempotencyGate::new(store.clone()),
            writer: ExpenseWriteService::new(store.clone(), limits),
            store,
            started: Instant::now(),
        }
    }

    pub fn with_writer(mut self, writer: ExpenseWriteService) -> Self {
        self.writer = writer;
        self
    }
}

/// Build the API router.
///
/// - POST /api/expenses
/// - GET /api/expenses
/// - GET /api/health
///
/// Everything else answers 404 `NOT_FOUND`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/api/expenses",
            post(handlers::create_expense).get(handlers::list_expenses),
        )
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, OutlayError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| OutlayError::Config(format!("failed to bind {addr}: {e}")))
}

/// Serve the API on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), OutlayError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, store = state.store.name(), "expense API listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| OutlayError::Internal(format!("server error: {e}")))?;
    tracing::info!("expense API stopped");
    Ok(())
}

/// Bind the configured address and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), OutlayError> {
    let listener = bind(config).await?;
    serve(listener, state, shutdown).await
}
