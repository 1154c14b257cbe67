//! Asynchronous RAPI client.

use crate::instances::InstanceService;
use crate::jobs::JobService;
use crate::nodes::NodeService;
use crate::Result;
use ganeti_core::{ApiClient, ApiClientBuilder, ClientConfig, Clock, RapiClientConfig, SystemClock};
use std::sync::Arc;
use url::Url;

const USER_AGENT: &str = concat!("ganeti-rapi/", env!("CARGO_PKG_VERSION"));

/// Builder for [`GanetiRapiClient`].
#[derive(Debug)]
pub struct GanetiRapiClientBuilder {
    inner: ApiClientBuilder,
    clock: Option<Arc<dyn Clock>>,
}

impl GanetiRapiClientBuilder {
    /// Create a builder for the given connection settings.
    #[must_use]
    pub fn new(config: RapiClientConfig) -> Self {
        Self {
            inner: ApiClientBuilder::new(config).with_user_agent(USER_AGENT),
            clock: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.inner = self.inner.with_user_agent(user_agent);
        self
    }

    /// Use a custom time source for job waits.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GanetiRapiClient> {
        let api = self.inner.build()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        Ok(GanetiRapiClient { api, clock })
    }
}

/// Client for one Ganeti cluster.
///
/// The instance, job and node services borrow the client's session, so every call shares
/// one connection pool and one set of credentials.
#[derive(Clone)]
pub struct GanetiRapiClient {
    api: ApiClient,
    clock: Arc<dyn Clock>,
}

impl GanetiRapiClient {
    /// Construct a client from connection settings.
    pub fn new(config: RapiClientConfig) -> Result<Self> {
        GanetiRapiClientBuilder::new(config).build()
    }

    /// Connect to `address` (`host:port`) with basic authentication.
    pub fn connect(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        tls_verify: bool,
    ) -> Result<Self> {
        let config = RapiClientConfig::new(address, username, password)?.with_tls_verify(tls_verify);
        Self::new(config)
    }

    /// Start a builder.
    #[must_use]
    pub fn builder(config: RapiClientConfig) -> GanetiRapiClientBuilder {
        GanetiRapiClientBuilder::new(config)
    }

    /// Return the versioned base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.api.base_url()
    }

    /// The underlying session, for endpoints without a dedicated service.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Instance operations.
    #[must_use]
    pub const fn instances(&self) -> InstanceService<'_> {
        InstanceService::new(&self.api)
    }

    /// Job operations.
    #[must_use]
    pub fn jobs(&self) -> JobService<'_> {
        JobService::new(&self.api, self.clock.as_ref())
    }

    /// Node queries.
    #[must_use]
    pub const fn nodes(&self) -> NodeService<'_> {
        NodeService::new(&self.api)
    }

    /// Close this handle. Clones keep the session open until they are closed or dropped.
    pub fn close(self) {
        self.api.close();
    }
}
