//! Application state shared across handlers.

use std::sync::Arc;

use broadcaster::Broadcaster;
use database::Database;
use invoicing::{InvoiceSender, InvoiceSync, SpreadsheetSource};

/// Sync engine over whichever spreadsheet source the binary wires in.
pub type SharedSync = Arc<InvoiceSync<Arc<dyn SpreadsheetSource>>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Spreadsheet sync.
    pub sync: SharedSync,
    /// Invoice delivery.
    pub sender: InvoiceSender,
    /// Notification fan-out.
    pub broadcaster: Broadcaster,
    /// Spreadsheet used when a sync request names none.
    pub default_spreadsheet_id: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        source: Arc<dyn SpreadsheetSource>,
        sender: InvoiceSender,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            sync: Arc::new(InvoiceSync::new(source, db.clone())),
            db,
            sender,
            broadcaster,
            default_spreadsheet_id: None,
        }
    }

    /// Set the spreadsheet synced by default.
    pub fn with_default_spreadsheet(mut self, spreadsheet_id: Option<String>) -> Self {
        self.default_spreadsheet_id = spreadsheet_id;
        self
    }
}
