// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Outlay expense tracker.
//!
//! Create requests pass through the [`IdempotencyGate`] and then the
//! [`ExpenseWriteService`]; a request retried with the same key is answered
//! with the stored record instead of creating a second one.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod server;
pub mod service;

pub use error::{ApiError, ErrorResponse};
pub use gate::IdempotencyGate;
pub use server::{GatewayState, bind, router, serve, start_server};
pub use service::ExpenseWriteService;
