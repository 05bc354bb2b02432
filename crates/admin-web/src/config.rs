//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use sheet_source::SheetsAuth;

/// Admin API configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// ZNS API base URL.
    pub zns_api_url: String,
    /// ZNS OA access token.
    pub zns_access_token: String,
    /// Template used for invoice messages.
    pub invoice_template_id: String,
    /// Template used for notification broadcasts.
    pub notification_template_id: String,
    /// Google Sheets API base URL.
    pub sheets_api_url: String,
    /// Google Sheets credential.
    pub sheets_auth: SheetsAuth,
    /// Spreadsheet synced when a request names none.
    pub default_spreadsheet_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ADMIN_ADDR` | Server bind address | `127.0.0.1:8788` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:property.db?mode=rwc` |
    /// | `ZNS_API_URL` | ZNS API base URL | `https://business.openapi.zalo.me` |
    /// | `ZNS_ACCESS_TOKEN` | ZNS access token | (required) |
    /// | `ZNS_INVOICE_TEMPLATE_ID` | Invoice template | `420761` |
    /// | `ZNS_NOTIFICATION_TEMPLATE_ID` | Notification template | (required) |
    /// | `SHEETS_API_URL` | Sheets API base URL | `https://sheets.googleapis.com` |
    /// | `GOOGLE_SHEETS_ACCESS_TOKEN` | OAuth token, preferred over the key | - |
    /// | `GOOGLE_SHEETS_API_KEY` | API key | one of the two is required |
    /// | `DEFAULT_SPREADSHEET_ID` | Spreadsheet used when none is given | - |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("ADMIN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8788".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:property.db?mode=rwc".to_string());

        let zns_api_url = env::var("ZNS_API_URL")
            .unwrap_or_else(|_| zns_client::config::DEFAULT_BASE_URL.to_string());
        let zns_access_token = required("ZNS_ACCESS_TOKEN")?;
        let invoice_template_id = env::var("ZNS_INVOICE_TEMPLATE_ID")
            .unwrap_or_else(|_| invoicing::DEFAULT_INVOICE_TEMPLATE_ID.to_string());
        let notification_template_id = required("ZNS_NOTIFICATION_TEMPLATE_ID")?;

        let sheets_api_url = env::var("SHEETS_API_URL")
            .unwrap_or_else(|_| sheet_source::config::DEFAULT_BASE_URL.to_string());
        let sheets_auth = match (optional("GOOGLE_SHEETS_ACCESS_TOKEN"), optional("GOOGLE_SHEETS_API_KEY")) {
            (Some(token), _) => SheetsAuth::AccessToken(token),
            (None, Some(key)) => SheetsAuth::ApiKey(key),
            (None, None) => return Err(ConfigError::MissingSheetsCredential),
        };

        Ok(Self {
            addr,
            database_url,
            zns_api_url,
            zns_access_token,
            invoice_template_id,
            notification_template_id,
            sheets_api_url,
            sheets_auth,
            default_spreadsheet_id: optional("DEFAULT_SPREADSHEET_ID"),
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ADMIN_ADDR format")]
    InvalidAddr,

    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("GOOGLE_SHEETS_ACCESS_TOKEN or GOOGLE_SHEETS_API_KEY is required")]
    MissingSheetsCredential,
}
