//! Client configuration and the request skeleton shared by every API call.
//!
//! Configuration is an explicit, immutable [`ClientConfig`] value. Environment
//! variables (`SNYK_API`, `SNYK_TOKEN`) are consulted only as fallbacks when
//! the corresponding field is empty, at the moment the client is built.

use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cloudapi::CloudApi;
use crate::error::ProviderError;
use crate::http::{new_client, HttpClientOptions};
use crate::organization::OrganizationApi;

/// Fallback for the API base URL.
pub const SNYK_API_ENV: &str = "SNYK_API";

/// Fallback for the API token.
pub const SNYK_TOKEN_ENV: &str = "SNYK_TOKEN";

/// Settings needed to talk to the Snyk API.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL. Only scheme, host and port are kept.
    pub endpoint: String,
    /// Personal or service-account API token, sent as `token <value>`.
    pub token: String,
    /// OAuth access token, sent as `Bearer <value>`. Takes precedence over `token`.
    pub bearer_token: String,
    /// Transport settings.
    pub http: HttpClientOptions,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &redact(&self.token))
            .field("bearer_token", &redact(&self.bearer_token))
            .field("http", &self.http)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl ClientConfig {
    /// Configuration with an endpoint and an API token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    /// Configuration drawn entirely from the environment.
    pub fn from_env() -> Self {
        Self {
            http: HttpClientOptions::from_env(),
            ..Default::default()
        }
    }

    /// Authenticate with an OAuth bearer token instead of an API token.
    pub fn with_bearer_token(mut self, bearer_token: impl Into<String>) -> Self {
        self.bearer_token = bearer_token.into();
        self
    }

    /// Replace the transport settings.
    pub fn with_http_options(mut self, http: HttpClientOptions) -> Self {
        self.http = http;
        self
    }

    /// Apply environment fallbacks, sanitize the URL and build the auth header.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when no URL or token is
    /// available, or when the URL cannot be parsed.
    pub fn resolve(&self) -> Result<ResolvedConfig, ProviderError> {
        let endpoint = first_non_empty(&self.endpoint, SNYK_API_ENV)
            .ok_or_else(|| ProviderError::Configuration("no URL provided".to_string()))?;

        let authorization = if !self.bearer_token.is_empty() {
            format!("Bearer {}", self.bearer_token)
        } else {
            let token = first_non_empty(&self.token, SNYK_TOKEN_ENV)
                .ok_or_else(|| ProviderError::Configuration("no token provided".to_string()))?;
            format!("token {}", token)
        };

        Ok(ResolvedConfig {
            base_url: sanitize_url(&endpoint)?,
            authorization,
        })
    }
}

fn first_non_empty(value: &str, env_var: &str) -> Option<String> {
    if !value.is_empty() {
        return Some(value.to_string());
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}

/// Reduce an endpoint to its origin, e.g. `https://api.snyk.io/rest` → `https://api.snyk.io`.
fn sanitize_url(endpoint: &str) -> Result<String, ProviderError> {
    let parsed = Url::parse(endpoint)
        .map_err(|err| ProviderError::Configuration(format!("invalid URL: {}", err)))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(ProviderError::Configuration(format!(
            "invalid URL: {} has no host",
            endpoint
        )));
    }
    Ok(origin.ascii_serialization())
}

/// Configuration after fallbacks have been applied.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Origin every request path is appended to.
    pub base_url: String,
    authorization: String,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ResolvedConfig {
    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }
}

/// Body encoding announced in the `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MediaType {
    /// REST endpoints (`/rest/...`).
    JsonApi,
    /// Legacy v1 endpoints.
    Json,
}

impl MediaType {
    fn as_str(self) -> &'static str {
        match self {
            Self::JsonApi => "application/vnd.api+json",
            Self::Json => "application/json",
        }
    }
}

/// One API call: where to send it and which status counts as success.
#[derive(Debug)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    media_type: MediaType,
    body: Option<Vec<u8>>,
    expected: StatusCode,
}

impl ApiRequest {
    fn new(method: Method, path: String, expected: StatusCode) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            media_type: MediaType::JsonApi,
            body: None,
            expected,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path.into(), StatusCode::OK)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path.into(), StatusCode::CREATED)
    }

    pub(crate) fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path.into(), StatusCode::OK)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path.into(), StatusCode::NO_CONTENT)
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub(crate) fn version(self, version: &str) -> Self {
        self.query("version", version)
    }

    pub(crate) fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub(crate) fn expect(mut self, status: StatusCode) -> Self {
        self.expected = status;
        self
    }

    pub(crate) fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ProviderError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }
}

/// Transport plus resolved configuration, shared by the endpoint-family clients.
///
/// Cloning is cheap: the underlying connection pool is reference counted.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ResolvedConfig,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build the transport and resolve `config`.
    ///
    /// # Errors
    ///
    /// Fails on any configuration error; see [`ClientConfig::resolve`] and
    /// [`crate::http::new_client`].
    pub fn new(config: &ClientConfig) -> Result<Self, ProviderError> {
        let resolved = config.resolve()?;
        let http = new_client(&config.http)?;
        Ok(Self::with_http_client(http, resolved))
    }

    /// Use an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, config: ResolvedConfig) -> Self {
        Self { http, config }
    }

    /// Origin requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send a request and return the body of a response carrying the expected status.
    ///
    /// Any other status becomes [`ProviderError::UnexpectedStatus`] with the
    /// body text attached.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub(crate) async fn execute(&self, request: ApiRequest) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.config.base_url, request.path);

        let mut builder = self
            .http
            .request(request.method, url)
            .header(CONTENT_TYPE, request.media_type.as_str())
            .header(AUTHORIZATION, self.config.authorization());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status != request.expected {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                expected = request.expected.as_u16(),
                "unexpected API response"
            );
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "API call completed");
        Ok(body)
    }
}

/// Decode a JSON response body.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    Ok(serde_json::from_str(body)?)
}

/// Every endpoint family behind one handle.
#[derive(Debug, Clone)]
pub struct SnykClient {
    /// Cloud environments and permissions.
    pub cloud: CloudApi,
    /// Organizations and their service accounts.
    pub organizations: OrganizationApi,
}

impl SnykClient {
    /// Build all clients over one shared transport.
    ///
    /// # Errors
    ///
    /// Fails on any configuration error.
    pub fn new(config: &ClientConfig) -> Result<Self, ProviderError> {
        Ok(Self::from_api_client(ApiClient::new(config)?))
    }

    /// Build all clients over an existing [`ApiClient`].
    pub fn from_api_client(api: ApiClient) -> Self {
        Self {
            cloud: CloudApi::new(api.clone()),
            organizations: OrganizationApi::new(api),
        }
    }
}
