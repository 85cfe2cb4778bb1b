//! Client configuration.

use std::time::Duration;

use bazaar_core::ApiOrigin;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Where the storefront API lives.
    pub origin: ApiOrigin,
    /// Per-request timeout, applied to every dispatch including refreshes.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(origin: ApiOrigin) -> Self {
        Self {
            origin,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("bazaar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
