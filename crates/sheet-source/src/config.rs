//! Configuration types for sheet-source.

/// Default Google Sheets API host.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// How requests are authorised.
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    /// API key passed as the `key` query parameter (public sheets).
    ApiKey(String),
    /// OAuth2 access token sent as a bearer token.
    AccessToken(String),
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsAuth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            SheetsAuth::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// Configuration for the Sheets client.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Base URL of the API (e.g., "https://sheets.googleapis.com").
    pub base_url: String,
    pub auth: SheetsAuth,
}

impl SheetsConfig {
    /// Create a configuration against the default host.
    pub fn new(auth: SheetsAuth) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, auth)
    }

    /// Create a configuration against a custom host.
    pub fn with_base_url(base_url: impl Into<String>, auth: SheetsAuth) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Get the values endpoint URL for a spreadsheet and A1 range.
    pub fn values_url(&self, spreadsheet_id: &str, a1_range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(a1_range)
        )
    }
}
