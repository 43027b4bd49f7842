use std::time::Duration;

use loadplan_domain::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use loadplan_domain::{LoadplanError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::InfraError;

/// Longest error body excerpt carried into a domain error
const ERROR_BODY_EXCERPT: usize = 200;

/// HTTP client with a per-request timeout and status classification.
///
/// Retries are owned by the caller (the sync orchestrator); this client maps
/// every failure into a [`LoadplanError`] that says whether a retry makes
/// sense: 5xx and transport failures become `Network`, 4xx become `Request`.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute a request; non-2xx responses are returned as errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| LoadplanError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        // Query strings carry the API key; only log the path.
        let path = request.url().path().to_string();
        debug!(%method, %path, "sending HTTP request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| LoadplanError::from(InfraError::from(err)))?;

        let status = response.status();
        debug!(%method, %path, %status, "received HTTP response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
        let reason = status.canonical_reason().unwrap_or("unknown status");
        let message = if excerpt.trim().is_empty() {
            reason.to_string()
        } else {
            format!("{reason}: {}", excerpt.trim())
        };
        Err(LoadplanError::from_status(status.as_u16(), message))
    }

    /// GET and return the raw body.
    pub async fn get_bytes(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.send(builder).await?;
        let bytes =
            response.bytes().await.map_err(|err| LoadplanError::from(InfraError::from(err)))?;
        Ok(bytes.to_vec())
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let bytes = self.get_bytes(builder).await?;
        serde_json::from_slice(&bytes).map_err(|err| InfraError::from(err).into())
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            user_agent: Some(concat!("loadplan/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| LoadplanError::from(InfraError::from(err)))?;
        Ok(HttpClient { client })
    }
}
