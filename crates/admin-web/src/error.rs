//! Error types for the admin API and their JSON rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use invoicing::InvoicingError;
use thiserror::Error;

/// Errors that can occur in the admin API.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Store error.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Sync, billing or send workflow error.
    #[error(transparent)]
    Invoicing(#[from] InvoicingError),

    /// Notification broadcast error.
    #[error(transparent)]
    Broadcast(#[from] broadcaster::Error),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
}

/// How an error is reported: HTTP status, JSend status and message.
fn classify_database(err: &DatabaseError) -> (StatusCode, &'static str, String) {
    match err {
        DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, "fail", err.to_string()),
        DatabaseError::AlreadyExists { .. } | DatabaseError::InUse { .. } => {
            (StatusCode::CONFLICT, "fail", err.to_string())
        }
        DatabaseError::Validation(_) => (StatusCode::BAD_REQUEST, "fail", err.to_string()),
        _ => {
            tracing::error!("Database error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "Internal server error".to_string(),
            )
        }
    }
}

impl AdminError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AdminError::Database(err) => classify_database(err),
            AdminError::Invoicing(InvoicingError::Database(err)) => classify_database(err),
            AdminError::Invoicing(InvoicingError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "fail", msg.clone())
            }
            AdminError::Invoicing(err @ InvoicingError::Source(_)) => {
                tracing::warn!("Spreadsheet source error: {}", err);
                (StatusCode::BAD_GATEWAY, "error", err.to_string())
            }
            AdminError::Broadcast(broadcaster::Error::Database(err)) => classify_database(err),
            AdminError::Broadcast(broadcaster::Error::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "fail", msg.clone())
            }
            AdminError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "fail", msg.clone()),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.classify();

        let body = serde_json::json!({
            "status": kind,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;
