//! Admin backend API client.
//!
//! Authenticated HTTP communication with the Kirana admin backend: order
//! pages for the workbench and the poller, single-order loads, and the
//! status / cancel / assign mutations. All calls carry the session's
//! bearer token; a 401 invalidates the session and surfaces as
//! `ApiError::Unauthorized`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::error::{ApiError, ApiResult};
use crate::filters::OrderFilter;
use crate::models::{Order, OrderStatus, StaffAssignment};
use crate::session::Session;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the admin backend URL:
/// - strip trailing slashes
/// - strip a trailing `/api` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /api
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    // Strip trailing slashes again (in case "/api/" was present)
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Backend ports
// ---------------------------------------------------------------------------

/// The one call the notification poller needs: the most recent orders,
/// newest first. Split from `OrderBackend` so a push subscription could
/// stand in for polling without touching detection.
#[async_trait]
pub trait OrderFeed: Send + Sync {
    async fn recent_orders(&self, limit: u32) -> ApiResult<Vec<Order>>;
}

/// Everything the workbench does against the backend.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<Order>>;
    async fn get_order(&self, order_number: &str) -> ApiResult<Order>;
    async fn update_status(&self, order_number: &str, status: OrderStatus) -> ApiResult<()>;
    async fn cancel_order(&self, order_number: &str) -> ApiResult<()>;
    async fn assign_staff(
        &self,
        order_number: &str,
        assignment: &StaffAssignment,
    ) -> ApiResult<()>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Envelope every backend response wraps its payload in.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

fn parse_data<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value::<Envelope<T>>(value)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::InvalidResponse(format!("unexpected response shape: {e}")))
}

/// Pull the backend's own error text out of a failure body, if it sent
/// one. Falls back to the generic per-status message otherwise.
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .or_else(|| json.get("message"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig, session: Session) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request and decode the JSON body, or `Null`
    /// for empty 204-style responses.
    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> ApiResult<Value> {
        let resp = req
            .bearer_auth(self.session.bearer_token())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            // Session is gone; stop everything scoped to it. The shell
            // handles re-login.
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, extract_error_message(&body)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(url, e))?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid JSON from admin backend: {e}")))
    }
}

#[async_trait]
impl OrderBackend for ApiClient {
    async fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<Order>> {
        let url = self.endpoint("/api/orders");
        debug!(query = ?filter.to_query(), "fetching order page");
        let value = self
            .send(self.http.get(&url).query(&filter.to_query()), &url)
            .await?;
        parse_data(value)
    }

    async fn get_order(&self, order_number: &str) -> ApiResult<Order> {
        let url = self.endpoint(&format!("/api/orders/{order_number}"));
        let value = self.send(self.http.get(&url), &url).await?;
        parse_data(value)
    }

    async fn update_status(&self, order_number: &str, status: OrderStatus) -> ApiResult<()> {
        let url = self.endpoint(&format!("/api/orders/{order_number}/status"));
        let body = serde_json::json!({ "status": status });
        self.send(self.http.put(&url).json(&body), &url)
            .await
            .map(|_| ())
    }

    async fn cancel_order(&self, order_number: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("/api/orders/{order_number}/cancel"));
        self.send(self.http.put(&url), &url).await.map(|_| ())
    }

    async fn assign_staff(
        &self,
        order_number: &str,
        assignment: &StaffAssignment,
    ) -> ApiResult<()> {
        let url = self.endpoint(&format!("/api/orders/{order_number}/assign"));
        self.send(self.http.put(&url).json(assignment), &url)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl OrderFeed for ApiClient {
    async fn recent_orders(&self, limit: u32) -> ApiResult<Vec<Order>> {
        self.list_orders(&OrderFilter::recent(limit)).await
    }
}
