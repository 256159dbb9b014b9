// SPDX-FileCopyrightText: 2026 Outlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-shot calls to the expense API.
//!
//! A [`Transport`] performs exactly one request per call. Retrying is the
//! job of [`ExpenseClient`](crate::ExpenseClient); fault injection wraps a
//! transport in [`FaultyTransport`](crate::FaultyTransport).

use std::sync::Arc;

use async_trait::async_trait;
use outlay_config::model::ClientConfig;
use outlay_core::{
    CreateOutcome, Expense, ExpenseQuery, ExpenseSummary, IDEMPOTENCY_KEY_HEADER, IdempotencyKey,
    NewExpense,
};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;

/// Server health as reported by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// One request, one response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST an expense carrying `key` in the `Idempotency-Key` header.
    async fn create(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
    ) -> Result<CreateOutcome, ClientError>;

    /// GET the expense list.
    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, ClientError>;

    async fn health(&self) -> Result<HealthReport, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn create(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
    ) -> Result<CreateOutcome, ClientError> {
        (**self).create(expense, key).await
    }

    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, ClientError> {
        (**self).list(query).await
    }

    async fn health(&self) -> Result<HealthReport, ClientError> {
        (**self).health().await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEnvelope {
    #[serde(default)]
    is_idempotent_response: bool,
    data: CreateData,
}

#[derive(Deserialize)]
struct CreateData {
    expense: Expense,
}

#[derive(Deserialize)]
struct ListEnvelope {
    data: ExpenseSummary,
}

/// [`Transport`] over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for `config.base_url` with the configured
    /// per-request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(client, &config.base_url)
    }

    /// Use an existing reqwest client, e.g. one shared with other callers.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClientError::Network(format!("invalid base URL `{base_url}`: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Network(format!("invalid endpoint `{path}`: {e}")))
    }
}

/// Read the body, turning non-success statuses into [`ClientError::Http`].
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(ClientError::from_reqwest)?;
    if !status.is_success() {
        return Err(ClientError::from_response(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn create(
        &self,
        expense: &NewExpense,
        key: &IdempotencyKey,
    ) -> Result<CreateOutcome, ClientError> {
        let url = self.endpoint("expenses")?;
        let response = self
            .client
            .post(url)
            .header(IDEMPOTENCY_KEY_HEADER, key.as_str())
            .json(expense)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        debug!(status = %response.status(), key = %key, "create response received");

        let envelope: CreateEnvelope = read_json(response).await?;
        Ok(CreateOutcome {
            expense: envelope.data.expense,
            replayed: envelope.is_idempotent_response,
        })
    }

    async fn list(&self, query: &ExpenseQuery) -> Result<ExpenseSummary, ClientError> {
        let mut url = self.endpoint("expenses")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            pairs.append_pair("sort", &query.sort.to_string());
        }
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        debug!(status = %response.status(), "list response received");

        let envelope: ListEnvelope = read_json(response).await?;
        Ok(envelope.data)
    }

    async fn health(&self) -> Result<HealthReport, ClientError> {
        let url = self.endpoint("health")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlay_core::{ErrorCode, SortOrder};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(&ClientConfig {
            base_url: format!("{}/api", server.uri()),
            request_timeout_ms: 500,
        })
        .unwrap()
    }

    fn lunch() -> NewExpense {
        NewExpense {
            amount: 1500.0,
            category: "Food".into(),
            description: "Lunch".into(),
            date: "2024-02-18".into(),
        }
    }

    fn expense_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "amount": 1500,
            "category": "Food",
            "description": "Lunch",
            "date": "2024-02-18",
            "idempotencyKey": "abc-123",
            "createdAt": "2024-02-18T10:30:00.000Z",
            "updatedAt": "2024-02-18T10:30:00.000Z"
        })
    }

    #[tokio::test]
    async fn create_sends_key_header_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/expenses"))
            .and(header("idempotency-key", "abc-123"))
            .and(body_json(json!({
                "amount": 1500.0,
                "category": "Food",
                "description": "Lunch",
                "date": "2024-02-18"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "success",
                "message": "Expense created successfully",
                "isIdempotentResponse": false,
                "data": {"expense": expense_json("e-1")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = IdempotencyKey::parse("abc-123").unwrap();
        let outcome = transport(&server).create(&lunch(), &key).await.unwrap();
        assert!(!outcome.replayed);
        assert_eq!(outcome.expense.id, "e-1");
        assert_eq!(outcome.expense.amount.cents(), 150_000);
    }

    #[tokio::test]
    async fn replay_flag_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/expenses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Expense already created",
                "isIdempotentResponse": true,
                "data": {"expense": expense_json("e-1")}
            })))
            .mount(&server)
            .await;

        let key = IdempotencyKey::parse("abc-123").unwrap();
        let outcome = transport(&server).create(&lunch(), &key).await.unwrap();
        assert!(outcome.replayed);
    }

    #[tokio::test]
    async fn error_envelope_becomes_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "error",
                "code": "INVALID_IDEMPOTENCY_KEY",
                "message": "Idempotency-Key must be a non-empty string"
            })))
            .mount(&server)
            .await;

        let key = IdempotencyKey::parse("abc-123").unwrap();
        let err = transport(&server).create(&lunch(), &key).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Http { status: 400, code: Some(ErrorCode::InvalidIdempotencyKey), .. }
        ));
    }

    #[tokio::test]
    async fn slow_server_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let err = transport(&server).health().await.unwrap_err();
        assert_eq!(err, ClientError::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = HttpTransport::with_client(
            reqwest::Client::new(),
            &format!("http://127.0.0.1:{port}/api"),
        )
        .unwrap();

        let err = transport.list(&ExpenseQuery::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn list_passes_filter_and_sort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/expenses"))
            .and(query_param("category", "Food & Drink"))
            .and(query_param("sort", "date_asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Expenses retrieved successfully",
                "data": {"expenses": [expense_json("e-1")], "total": 1500, "count": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ExpenseQuery {
            category: Some("Food & Drink".into()),
            sort: SortOrder::DateAsc,
        };
        let summary = transport(&server).list(&query).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total.cents(), 150_000);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = transport(&server).health().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn base_url_with_or_without_trailing_slash() {
        for base in ["http://localhost:5000/api", "http://localhost:5000/api/"] {
            let t = HttpTransport::with_client(reqwest::Client::new(), base).unwrap();
            assert_eq!(
                t.endpoint("expenses").unwrap().as_str(),
                "http://localhost:5000/api/expenses"
            );
        }
    }
}
