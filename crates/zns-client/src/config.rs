//! Configuration types for zns-client.

/// Default ZNS API host.
pub const DEFAULT_BASE_URL: &str = "https://business.openapi.zalo.me";

/// Configuration for the ZNS API client.
#[derive(Clone)]
pub struct ZnsConfig {
    /// Base URL of the API (e.g., "https://business.openapi.zalo.me").
    pub base_url: String,
    /// Official Account access token.
    pub access_token: String,
    /// Request timeout in seconds. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
}

impl ZnsConfig {
    /// Create a configuration against the default host.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, access_token)
    }

    /// Create a configuration against a custom host.
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout_secs: None,
        }
    }

    /// Bound every request by a timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Get the template message endpoint URL.
    pub fn template_url(&self) -> String {
        format!("{}/message/template", self.base_url)
    }
}

impl std::fmt::Debug for ZnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZnsConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
