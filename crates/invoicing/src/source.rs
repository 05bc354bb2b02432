//! Spreadsheet source seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use sheet_source::SheetRange;

/// Failure to read the external spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Network failure or an unexpected response.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected.
    #[error("source authentication failed: {0}")]
    Auth(String),
}

/// Reads raw rows of cell text from a spreadsheet.
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    /// Fetch every row of `range`, in sheet order.
    ///
    /// Rows may be shorter than the column span; missing trailing cells are
    /// treated as empty by the parser.
    async fn fetch_rows(
        &self,
        source_id: &str,
        range: &SheetRange,
    ) -> Result<Vec<Vec<String>>, SourceError>;
}

#[async_trait]
impl<T: SpreadsheetSource + ?Sized> SpreadsheetSource for Arc<T> {
    async fn fetch_rows(
        &self,
        source_id: &str,
        range: &SheetRange,
    ) -> Result<Vec<Vec<String>>, SourceError> {
        (**self).fetch_rows(source_id, range).await
    }
}
