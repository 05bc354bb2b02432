//! Error types for the invoicing core.

use database::DatabaseError;
use thiserror::Error;

use crate::billing::AmountOverflow;
use crate::source::SourceError;

/// Errors surfaced by sync, manual creation and the send workflow.
///
/// Row-level problems during sync and per-invoice dispatch failures are not
/// errors; they are collected in the operation's report instead.
#[derive(Debug, Error)]
pub enum InvoicingError {
    /// Store failure, including not-found and uniqueness conflicts.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The spreadsheet could not be read. Aborts the whole sync.
    #[error("spreadsheet source error: {0}")]
    Source(#[from] SourceError),

    /// Caller input rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),
}

impl InvoicingError {
    /// Whether the error refers to a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InvoicingError::Database(e) if e.is_not_found())
    }
}

impl From<database::ValidationError> for InvoicingError {
    fn from(err: database::ValidationError) -> Self {
        InvoicingError::Validation(err.to_string())
    }
}

impl From<AmountOverflow> for InvoicingError {
    fn from(err: AmountOverflow) -> Self {
        InvoicingError::Validation(err.to_string())
    }
}

/// Result type for invoicing operations.
pub type Result<T> = std::result::Result<T, InvoicingError>;
