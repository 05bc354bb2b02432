//! Error types for sheet-source.

use thiserror::Error;

/// Errors that can occur when reading a spreadsheet.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// HTTP request failed (DNS, connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected (HTTP 401/403).
    #[error("authentication failed (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid configuration or range.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SheetsError {
    /// True when the failure is about credentials rather than availability.
    pub fn is_auth(&self) -> bool {
        matches!(self, SheetsError::Auth { .. })
    }
}
