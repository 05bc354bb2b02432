//! Google Sheets values client.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{SheetsAuth, SheetsConfig};
use crate::error::SheetsError;
use crate::range::SheetRange;

/// `spreadsheets.values.get` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    range: Option<String>,
    /// Absent when the range is empty.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Read-only client for spreadsheet cell values.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
}

impl SheetsClient {
    /// Build a client. No request is made until the first fetch.
    pub fn new(config: SheetsConfig) -> Result<Self, SheetsError> {
        let credential = match &config.auth {
            SheetsAuth::ApiKey(key) => key,
            SheetsAuth::AccessToken(token) => token,
        };
        if credential.trim().is_empty() {
            return Err(SheetsError::Config("credential is empty".to_string()));
        }

        let http = Client::builder().build().map_err(SheetsError::Http)?;
        info!("Sheets client ready for {}", config.base_url);
        Ok(Self { http, config })
    }

    /// Fetch the formatted cell values of a range, one `Vec<String>` per row.
    ///
    /// Trailing empty cells are omitted by the API, so rows may be shorter
    /// than the requested column span.
    pub async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        range: &SheetRange,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        range.validate().map_err(SheetsError::Config)?;
        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Config("spreadsheet id is empty".to_string()));
        }

        let a1 = range.to_a1();
        let url = self.config.values_url(spreadsheet_id, &a1);
        debug!(spreadsheet_id = %spreadsheet_id, range = %a1, "Fetching sheet values");

        let request = self.http.get(&url);
        let request = match &self.config.auth {
            SheetsAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            SheetsAuth::AccessToken(token) => request.bearer_auth(token),
        };

        let response = request.send().await.map_err(SheetsError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SheetsError::Auth {
                    status: status.as_u16(),
                    body,
                },
                _ => SheetsError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body: ValueRange = response.json().await.map_err(SheetsError::Http)?;
        info!(
            range = body.range.as_deref().unwrap_or(&a1),
            rows = body.values.len(),
            "Fetched sheet values"
        );

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Get the configuration.
    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }
}

/// Render a cell as text. Formatted values arrive as strings already.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("config", &self.config)
            .finish()
    }
}
