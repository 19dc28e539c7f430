//! Registry service client.
//!
//! [`RegistryClient`] is the seam the orchestrator drives; [`HarborClient`] is
//! the reqwest implementation against the registry's REST API. Non-success
//! responses surface as [`ClientError::Status`] carrying the status code.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use harbormaster_core::HarborSettings;

use crate::error::ClientError;

/// A successful registry response.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty.
    pub body: Value,
}

impl RegistryResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Decode the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Request/response access to the registry service.
///
/// Paths are relative to the API base, e.g. `projects?name=foo`.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<RegistryResponse, ClientError>;
    async fn post(&self, path: &str, body: &Value) -> Result<RegistryResponse, ClientError>;
    async fn delete(&self, path: &str) -> Result<RegistryResponse, ClientError>;
}

#[async_trait]
impl<T: RegistryClient + ?Sized> RegistryClient for Arc<T> {
    async fn get(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RegistryResponse, ClientError> {
        (**self).post(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        (**self).delete(path).await
    }
}

/// Percent-encode a value for use inside a query string.
pub fn encode_query_value(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode each `/`-separated segment of `path`, keeping the separators.
pub fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// reqwest-backed client using basic auth.
#[derive(Clone)]
pub struct HarborClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for HarborClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarborClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HarborClient {
    pub fn new(settings: &HarborSettings) -> Result<Self, ClientError> {
        let mut base = settings.base_api_url.clone();
        // `Url::join` drops the last segment unless the base ends in '/'.
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&base)?,
            username: settings.username.clone(),
            password: settings.password.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<RegistryResponse, ClientError> {
        let response = request
            .basic_auth(&self.username, self.password.as_deref())
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let success = response.status().is_success();
        let text = response.text().await?;

        if !success {
            return Err(ClientError::Status {
                status,
                message: error_message(&text),
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(RegistryResponse { status, body })
    }
}

#[async_trait]
impl RegistryClient for HarborClient {
    async fn get(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "GET");
        self.execute(self.http.get(url)).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RegistryResponse, ClientError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        self.execute(self.http.post(url).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "DELETE");
        self.execute(self.http.delete(url)).await
    }
}

/// Pull a readable message out of an error body.
///
/// Handles `{"errors":[{"message":…}]}`, `{"message":…}` and plain text.
fn error_message(text: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        let nested = value
            .get("errors")
            .and_then(|e| e.get(0))
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = nested.or_else(|| value.get("message").and_then(Value::as_str)) {
            return message.to_string();
        }
    }
    text.trim().to_string()
}
