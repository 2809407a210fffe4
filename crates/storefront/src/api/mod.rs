//! REST client for the Phanto backend.
//!
//! # Architecture
//!
//! - One `reqwest::Client` shared behind an `Arc`, cheap to clone
//! - The backend is the source of truth; this layer never caches (see
//!   [`crate::catalog`] and [`crate::cart`] for that)
//! - Credentials come from an injected [`CredentialProvider`], never from
//!   ambient state
//!
//! # Endpoint groups
//!
//! - [`cart`](self::cart) - `/api/cart/...`
//! - [`catalog`](self::catalog) - `/api/products/...`
//! - [`orders`](self::orders) - `/api/orders/...`
//! - [`users`](self::users) - `/api/users/...`

mod cart;
mod catalog;
mod orders;
pub mod types;
mod users;

pub use catalog::ProductFilter;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::auth::CredentialProvider;
use crate::config::ApiConfig;

/// Longest slice of a response body kept in logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// A 2xx body that could not be decoded.
    #[error("Decode error on {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// A 2xx response without a body where one was required.
    #[error("Empty response from {0}")]
    EmptyBody(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured base URL cannot be joined with an endpoint.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of a server error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }
}

/// Client for the Phanto REST backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                credentials,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a request for `endpoint`, attaching the bearer token if any.
    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(endpoint)?;
        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.inner.credentials.bearer_token() {
            request = request.bearer_auth(token.expose_secret());
        }

        Ok(request)
    }

    /// Send a request and return the raw successful response.
    ///
    /// Non-2xx statuses are turned into [`ApiError::Server`] with the best
    /// message the body offers.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(ApiError::Network)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "Token expired or invalid");
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body, status);
            warn!(
                endpoint,
                status = %status,
                body = %truncate(&body),
                "Backend returned non-success status"
            );
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body.
    ///
    /// Returns `Ok(None)` for `204 No Content` or an empty body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<Option<T>, ApiError> {
        let response = self.dispatch(request, endpoint).await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!(endpoint, "No content");
            return Ok(None);
        }

        let text = response.text().await.map_err(ApiError::Network)?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| {
            warn!(
                endpoint,
                error = %e,
                body = %truncate(&text),
                "Failed to decode backend response"
            );
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// `GET` an endpoint that must return a body.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, endpoint)?;
        self.execute(request, endpoint)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(endpoint.to_string()))
    }

    /// Send a JSON body and decode the (optional) reply.
    async fn send_json<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, endpoint)?.json(body);
        self.execute(request, endpoint).await
    }

    /// Send a body-less request and decode the (optional) reply.
    async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<Option<T>, ApiError> {
        let request = self.request(method, endpoint)?;
        self.execute(request, endpoint).await
    }

    /// `GET` an endpoint returning binary content.
    async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.request(Method::GET, endpoint)?;
        let response = self.dispatch(request, endpoint).await?;
        let bytes = response.bytes().await.map_err(ApiError::Network)?;
        Ok(bytes.to_vec())
    }
}

/// Pick a human-readable message out of an error body.
///
/// The backend uses `detail` (framework errors) or `error` (hand-written
/// views). Validation failures come back as `{field: [messages]}` and are
/// flattened into one line. Anything else falls back to the status line.
fn server_message(body: &str, status: StatusCode) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return format!("HTTP error! status: {}", status.as_u16());
    };

    let named = ["detail", "error", "message"]
        .iter()
        .find_map(|key| match value.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        });
    if let Some(message) = named {
        return message;
    }

    let mut fields = Vec::new();
    if let serde_json::Value::Object(map) = &value {
        for field in map.values() {
            flatten_messages(field, &mut fields);
        }
    }
    if fields.is_empty() {
        format!("HTTP error! status: {}", status.as_u16())
    } else {
        fields.join(", ")
    }
}

fn flatten_messages(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                flatten_messages(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                flatten_messages(item, out);
            }
        }
        serde_json::Value::Null => {}
        other => out.push(other.to_string()),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
