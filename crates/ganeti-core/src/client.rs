//! HTTP transport for the Ganeti Remote API.
//!
//! [`ApiClient`] owns the HTTP session, builds request URLs under the versioned base path,
//! executes one request per logical operation and turns non-success responses into typed
//! [`Error`]s. Requests are never retried.

use crate::config::RapiClientConfig;
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default timeout for RAPI requests (in seconds)
pub const RAPI_DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout (in seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

const USER_AGENT: &str = concat!("ganeti-core/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts and connection pooling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(RAPI_DEFAULT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    config: RapiClientConfig,
    http_config: ClientConfig,
    user_agent: String,
}

impl ApiClientBuilder {
    /// Create a builder from a validated [`RapiClientConfig`].
    #[must_use]
    pub fn new(config: RapiClientConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client and its HTTP session.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, the CA certificate cannot be loaded or
    /// the HTTP session cannot be created.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self.config.base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = ClientBuilder::new()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.http_config.timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT))
            .gzip(self.http_config.enable_compression);

        if !self.config.tls_verify {
            warn!("TLS verification disabled for RAPI client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.config.tls_ca_cert {
            debug!("loading RAPI CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read RAPI CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid RAPI CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build RAPI HTTP client: {err}")))?;

        Ok(ApiClient {
            http,
            base_url,
            credentials: Arc::new(self.config),
            enable_logging: self.http_config.enable_logging,
        })
    }
}

/// Authenticated HTTP session against a RAPI endpoint.
///
/// Cloning shares the underlying connection pool. The pool is released once every clone
/// has been dropped or passed to [`ApiClient::close`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: Arc<RapiClientConfig>,
    enable_logging: bool,
}

impl ApiClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`ApiClientBuilder::build`].
    pub fn new(config: RapiClientConfig) -> Result<Self> {
        ApiClientBuilder::new(config).build()
    }

    /// Start a builder for the given configuration.
    #[must_use]
    pub fn builder(config: RapiClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Return the versioned base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for a relative endpoint: `{base_url}/{endpoint}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the result is not a valid URL.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Url::parse(&format!("{base}/{endpoint}")).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid RAPI endpoint `{endpoint}`: {err}"))
        })
    }

    /// Issue a GET request with query parameters.
    ///
    /// # Errors
    ///
    /// Returns a typed error for non-success responses or transport failures.
    pub async fn get(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<Value> {
        self.request::<()>(Method::GET, endpoint, params, None).await
    }

    /// Issue a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a typed error for non-success responses or transport failures.
    pub async fn post<B>(&self, endpoint: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, &[], Some(body)).await
    }

    /// Issue a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a typed error for non-success responses or transport failures.
    pub async fn put<B>(&self, endpoint: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, &[], Some(body)).await
    }

    /// Issue a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns a typed error for non-success responses or transport failures.
    pub async fn delete(&self, endpoint: &str) -> Result<Value> {
        self.request::<()>(Method::DELETE, endpoint, &[], None).await
    }

    /// Close this handle.
    ///
    /// Clones share one connection pool, which is released when the last handle is closed
    /// or dropped.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing RAPI session");
    }

    async fn request<B>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .basic_auth(&self.credentials.username, Some(self.credentials.password()));
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        if self.enable_logging {
            info!(%method, %url, "Sending RAPI request");
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..400).contains(&status) {
            let error = Error::from_response(status, &text, url.as_str());
            if error.should_log() {
                warn!(%method, %url, status, "RAPI request failed: {error}");
            } else {
                debug!(%method, %url, status, "RAPI request rejected: {error}");
            }
            return Err(error);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|err| {
            Error::ParseError(format!("Invalid JSON in response from `{url}`: {err}"))
        })
    }
}
