/// TeamCity REST API client implementation
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::domain::errors::ApiError;
use crate::domain::models::HttpConfig;
use crate::domain::ports::TeamCityApi;

/// Configuration for the TeamCity HTTP client
#[derive(Clone)]
pub struct TeamCityClientConfig {
    /// Base URL of the server, e.g. `https://teamcity.example.com`
    pub server_url: String,

    /// Access token sent as a bearer credential
    pub token: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl TeamCityClientConfig {
    pub fn new(server_url: impl Into<String>, token: impl Into<String>, http: &HttpConfig) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            request_timeout_secs: http.request_timeout_secs,
            connect_timeout_secs: http.connect_timeout_secs,
        }
    }
}

impl fmt::Debug for TeamCityClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamCityClientConfig")
            .field("server_url", &self.server_url)
            .field("token", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// HTTP client for the TeamCity REST API
///
/// - Every request carries `Authorization: Bearer <token>`
/// - Mutations also carry `Origin: <server>` to satisfy CSRF protection
/// - Bodies are buffered in full before decoding
/// - No retries: a non-2xx status is reported to the caller as is
pub struct TeamCityClient {
    /// Reusable HTTP client with connection pooling
    http_client: ReqwestClient,

    /// Server base URL without trailing slash
    server_url: String,

    /// Access token
    token: String,
}

impl TeamCityClient {
    /// Create a new client
    ///
    /// # Returns
    /// * `Ok(TeamCityClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to build HTTP client
    pub fn new(config: TeamCityClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    /// Server base URL, as sent in the `Origin` header
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.server_url, path)
        } else {
            format!("{}/{}", self.server_url, path)
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Buffer the body and fail on any non-2xx status
    async fn read_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "request rejected by server");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Property endpoints answer in `text/plain`; other mutations may answer in JSON
pub const PUT_ACCEPT: &str = "text/plain, application/json;q=0.9, */*;q=0.1";

/// Map a reqwest failure onto the transport-independent error type
fn classify(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[async_trait]
impl TeamCityApi for TeamCityClient {
    #[instrument(skip(self), level = "debug")]
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self
            .http_client
            .get(self.url(path))
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let body = Self::read_body(response).await?;
        debug!(bytes = body.len(), "response received");

        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self, body), level = "debug")]
    async fn put(
        &self,
        path: &str,
        body: String,
        content_type: &str,
    ) -> Result<Option<Value>, ApiError> {
        let response = self
            .http_client
            .put(self.url(path))
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::ORIGIN, self.server_url.as_str())
            .header(header::CONTENT_TYPE, content_type)
            .header(header::ACCEPT, PUT_ACCEPT)
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let body = Self::read_body(response).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        // Property updates echo the new value as text/plain
        Ok(Some(
            serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body)),
        ))
    }
}
