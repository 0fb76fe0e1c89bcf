/*
[INPUT]:  HTTP configuration (base URL, timeouts, access token)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
[UPDATE]: 2026-10-16 Map 401/404/429 responses onto typed errors
[UPDATE]: 2026-10-16 Keep base URL path prefixes when resolving endpoints
*/

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::http::{FocusflowError, Result};

/// Default base URL for the Focusflow API
const DEFAULT_BASE_URL: &str = "https://api.focusflow.app";
const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
}

/// Main HTTP client for the Focusflow API
#[derive(Debug)]
pub struct FocusflowClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl FocusflowClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client pointed at an explicit base URL (self-hosted servers, wiremock)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(base_url)?,
            timeout: config.timeout,
            credentials: None,
        })
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoints resolve under the base path, so `https://host/v1/` + `api/x` is `/v1/api/x`
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build request builder for public endpoints
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder carrying the bearer token
    pub(crate) fn authed_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| FocusflowError::Unauthorized {
                message: "no access token configured".to_string(),
            })?;
        Ok(self
            .request(method, endpoint)?
            .bearer_auth(&credentials.access_token))
    }

    /// Send a request and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.dispatch(builder).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FocusflowError::InvalidResponse(
                "empty response body".to_string(),
            ));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose response body carries nothing of interest
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        let response = self.dispatch(builder).await?;
        let _ = response.bytes().await?;
        Ok(())
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response> {
        let request_id = Uuid::new_v4().to_string();
        let response = builder
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FocusflowError::Timeout {
                        duration: self.timeout.as_secs(),
                    }
                } else {
                    FocusflowError::Http(err)
                }
            })?;

        let status = response.status();
        debug!(request_id = %request_id, status = status.as_u16(), url = %response.url(), "api response");
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status, &body, retry_after))
    }
}

/// Parse a base URL, requiring http(s) and a trailing `/` on the path
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FocusflowError::Config(format!(
            "base URL must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(FocusflowError::Config(format!(
            "base URL must not carry a query or fragment: {raw}"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Translate a non-success response into a typed error
fn error_from_status(status: StatusCode, body: &str, retry_after: Option<u64>) -> FocusflowError {
    let message = extract_error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FocusflowError::Unauthorized { message }
        }
        StatusCode::NOT_FOUND => FocusflowError::NotFound { message },
        StatusCode::TOO_MANY_REQUESTS => FocusflowError::RateLimit {
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        _ => FocusflowError::api_error(status, message),
    }
}

/// Prefer the server's `error`/`message` field over the raw body
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(|field| field.as_str())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| body.trim().to_string())
}
