/// Authenticated JSON request executor against the remote API.
///
/// One call is one HTTP request: no retries, no timeouts beyond what the
/// HTTP client itself applies.
use std::fmt;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use reqwest::Method;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT_JSON: &str = "application/vnd.github+json";
const AGENT: &str = concat!("repodeck/", env!("CARGO_PKG_VERSION"));

/// Bearer token attached to every call. Never logged.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one call. `endpoint` is either an absolute URL or a path
    /// appended to the API base.
    ///
    /// A no-content response yields an empty JSON object. Any non-success
    /// status becomes `Error::Transport` (or `Error::Conflict` for 409);
    /// the caller decides what a 404 means.
    async fn call(&self, endpoint: &str, method: Method, body: Option<Value>) -> Result<Value>;
}

/// `Transport` over HTTPS.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpTransport {
    pub fn new(credential: Credential) -> Self {
        Self::with_base_url(credential, DEFAULT_API_BASE)
    }

    pub fn with_base_url(credential: Credential, base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), credential, base_url)
    }

    pub fn with_client(client: Client, credential: Credential, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.base_url, endpoint)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, endpoint: &str, method: Method, body: Option<Value>) -> Result<Value> {
        let url = self.resolve(endpoint);
        tracing::debug!(%method, %url, "remote call");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(self.credential.expose())
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, AGENT);
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("{method} {url}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(empty_object());
        }

        let text = resp
            .text()
            .await
            .map_err(|e| Error::Network(format!("{method} {url}: reading body: {e}")))?;

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| format!("remote API error: {}", status.as_u16()));
            tracing::debug!(status = status.as_u16(), %message, %url, "remote call failed");
            return Err(Error::from_status(status.as_u16(), message));
        }

        parse_body(&text)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Pull the remote's `message` out of an error body. Bodies that are not
/// JSON, or carry no message, yield `None`.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(empty_object());
    }
    serde_json::from_str(text).map_err(|e| Error::Malformed(format!("invalid JSON response: {e}")))
}
