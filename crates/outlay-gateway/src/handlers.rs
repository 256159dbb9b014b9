// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the expense API.
//!
//! Handles POST /api/expenses, GET /api/expenses, GET /api/health, and the
//! not-found fallback.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use outlay_core::{
    CreateOutcome, Expense, ExpenseDraft, ExpenseQuery, ExpenseSummary, HealthStatus, OutlayError,
};

use crate::error::ApiError;
use crate::gate;
use crate::server::GatewayState;

/// Response body for POST /api/expenses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// `true` when the record was created by an earlier request with the same key.
    pub is_idempotent_response: bool,
    pub data: ExpenseData,
}

#[derive(Debug, Serialize)]
pub struct ExpenseData {
    pub expense: Expense,
}

impl From<CreateOutcome> for ExpenseResponse {
    fn from(outcome: CreateOutcome) -> Self {
        Self {
            status: "success",
            message: if outcome.replayed {
                "Expense already created"
            } else {
                "Expense created successfully"
            },
            is_idempotent_response: outcome.replayed,
            data: ExpenseData {
                expense: outcome.expense,
            },
        }
    }
}

/// Response body for GET /api/expenses.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data: ExpenseSummary,
}

/// Query parameters for GET /api/expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Response body for GET /api/health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// POST /api/expenses
///
/// Returns 201 for a new record and 200 when the idempotency key matched an
/// existing one.
pub async fn create_expense(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<ExpenseDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(draft) = body.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
    let key = gate::extract_key(&headers, &draft)?;

    let outcome = match state.gate.check(key.as_ref()).await? {
        Some(existing) => CreateOutcome::replayed(existing),
        None => state.writer.create(&draft, key).await?,
    };

    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(ExpenseResponse::from(outcome))).into_response())
}

/// GET /api/expenses
pub async fn list_expenses(
    State(state): State<GatewayState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) = params
        .map_err(|e| OutlayError::InvalidFilter(format!("Invalid query string: {}", e.body_text())))?;
    let query = ExpenseQuery::from_params(params.category.as_deref(), params.sort.as_deref())?;
    let summary = state.store.list(&query).await?;
    tracing::debug!(
        count = summary.count,
        category = ?query.category,
        sort = %query.sort,
        "listed expenses"
    );
    Ok(Json(ListResponse {
        status: "success",
        message: "Expenses retrieved successfully",
        data: summary,
    }))
}

/// GET /api/health
pub async fn health(State(state): State<GatewayState>) -> Response {
    let uptime_secs = state.started.elapsed().as_secs();
    let (status, label, detail) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(why)) => (StatusCode::OK, "degraded", Some(why)),
        Ok(HealthStatus::Unhealthy(why)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(why))
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            Some(e.to_string()),
        ),
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs,
            detail,
        }),
    )
        .into_response()
}

/// Fallback for unknown routes and unsupported methods.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    OutlayError::NotFound(format!("Route {method} {} not found", uri.path())).into()
}
