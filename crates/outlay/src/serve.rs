// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `outlay serve` command implementation.
//!
//! Opens the SQLite store, wires the idempotency gate and write service into
//! the gateway, and serves until SIGINT or SIGTERM.

use std::sync::Arc;

use outlay_config::model::OutlayConfig;
use outlay_core::{ExpenseLimits, ExpenseStore, OutlayError};
use outlay_gateway::{GatewayState, start_server};
use outlay_storage::SqliteExpenseStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the `outlay serve` command.
pub async fn run_serve(config: OutlayConfig) -> Result<(), OutlayError> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        database = %config.storage.database_path,
        "starting outlay serve"
    );

    let store = Arc::new(SqliteExpenseStore::new(config.storage.clone()));
    store.initialize().await?;
    debug!(store = store.name(), "expense store ready");

    let limits = ExpenseLimits::from(&config.expense);
    let state = GatewayState::new(store.clone(), limits);

    let cancel = install_signal_handler();
    let served = start_server(&config.server, state, cancel).await;

    store.close().await?;
    served?;

    info!("outlay serve shutdown complete");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}
