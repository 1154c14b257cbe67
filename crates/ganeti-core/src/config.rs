//! Configuration structures for Ganeti RAPI clients.
//!
//! This module provides the connection configuration for a RAPI endpoint, including
//! credentials, TLS settings and validation.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default RAPI port used by Ganeti.
pub const DEFAULT_RAPI_PORT: u16 = 5080;

/// Version prefix appended to every RAPI base URL.
pub const RAPI_VERSION_PATH: &str = "2";

/// Connection settings for a Ganeti RAPI endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct RapiClientConfig {
    /// RAPI address as `host:port`, optionally prefixed with `http://` or `https://`
    #[validate(length(min = 1))]
    pub address: String,

    /// Basic authentication user
    #[validate(length(min = 1))]
    pub username: String,

    /// Basic authentication password
    pub password: SecretString,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a PEM encoded CA certificate
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl RapiClientConfig {
    /// Create a new configuration with required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the address does not form a valid URL.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            address: address.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.check()?;
        Ok(config)
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration document: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The password, for building authenticated requests.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Build the versioned RAPI base URL, e.g. `https://cluster.example.com:5080/2`.
    ///
    /// Addresses without a scheme use `https`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL cannot be parsed.
    pub fn base_url(&self) -> Result<Url, Error> {
        let address = self.address.trim().trim_end_matches('/');
        let root = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("https://{address}")
        };

        Url::parse(&format!("{root}/{RAPI_VERSION_PATH}"))
            .map_err(|e| Error::ConfigError(format!("Invalid RAPI address `{address}`: {e}")))
    }

    fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        self.base_url().map(|_| ())
    }
}
