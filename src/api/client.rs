//! HTTP client wrapper: base URL, bearer auth, and error normalization.
//!
//! Every facade call goes through [`ApiClient::call`]. Authenticated
//! endpoints get `Authorization: Bearer <token>` with the token read from
//! session storage at request time, so a login or logout takes effect on
//! the very next request.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::storage::{SessionStorage, TOKEN_KEY};

/// Static description of one remote endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: EndpointMethod,
    pub path: &'static str,
    /// Whether the bearer token is attached.
    pub authenticated: bool,
    /// Short name used in logs and on [`ApiError::operation`].
    pub operation: &'static str,
    /// Message shown when the server gives none.
    pub default_error: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointMethod {
    Get,
    Post,
}

impl From<EndpointMethod> for Method {
    fn from(m: EndpointMethod) -> Self {
        match m {
            EndpointMethod::Get => Method::GET,
            EndpointMethod::Post => Method::POST,
        }
    }
}

const HEALTH: Endpoint = Endpoint {
    method: EndpointMethod::Get,
    path: "/api/health",
    authenticated: false,
    operation: "health",
    default_error: "Health check failed",
};

/// Response of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Shared HTTP client for all facades.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn SessionStorage>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`.
    pub fn new(
        base_url: Url,
        timeout: Option<Duration>,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("math-practice/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::new("client", format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            storage,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Current bearer token, if a session is stored.
    async fn bearer(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read auth token from session storage");
                None
            }
        }
    }

    /// Call `endpoint` with an optional JSON body and decode the JSON reply.
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies all come
    /// back as one [`ApiError`] carrying a user-facing message.
    pub async fn call<B, T>(&self, endpoint: &Endpoint, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(endpoint.path);
        let mut request = self
            .http
            .request(endpoint.method.into(), &url)
            .header(reqwest::header::ACCEPT, "application/json");

        if endpoint.authenticated {
            if let Some(token) = self.bearer().await {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(operation = endpoint.operation, %url, "Sending API request");

        let fail = |message: String| ApiError::new(endpoint.operation, message);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(operation = endpoint.operation, error = %e, "API request failed in transport");
                return Err(fail(endpoint.default_error.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                warn!(operation = endpoint.operation, error = %e, "API response body could not be decoded");
                fail(endpoint.default_error.to_string())
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message =
            server_message(&body).unwrap_or_else(|| endpoint.default_error.to_string());
        warn!(
            operation = endpoint.operation,
            status = status.as_u16(),
            message = %message,
            "API request rejected"
        );
        Err(fail(message))
    }

    /// Ping `GET /api/health`.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.call::<(), _>(&HEALTH, None).await
    }
}

/// Pull a human-readable message out of an error body: `error` first, then
/// `message`. Blank strings don't count.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"].iter().find_map(|field| {
        value
            .get(*field)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
