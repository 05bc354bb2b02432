//! Error types for zns-client.

use thiserror::Error;

/// Errors that can occur when talking to the ZNS API.
#[derive(Debug, Error)]
pub enum ZnsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status from the API gateway.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The API answered with a non-zero error code.
    #[error("ZNS error {code}: {message}")]
    Api { code: i64, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
