//! Invoice core of the property back end.
//!
//! - [`parser`] decodes billing sheet rows into tenants and amounts
//! - [`billing`] derives electricity cost and totals
//! - [`reconcile`] upserts apartments, rooms, customers and invoices by business key
//! - [`sync`] runs a whole sheet range through the two above
//! - [`workflow`] sends invoices and records each attempt in the invoice history
//! - [`report`] flattens a period's invoices with their latest send attempt
//!
//! External systems are reached only through [`SpreadsheetSource`],
//! [`MessageDispatcher`] and [`TrackingCache`]. The HTTP clients implement
//! the first two in [`adapters`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use invoicing::{InvoiceSender, InvoiceSync, MemoryTrackingCache, SheetRange};
//! use sheet_source::{SheetsAuth, SheetsClient, SheetsConfig};
//! use zns_client::{ZnsClient, ZnsConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:property.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let sheets = SheetsClient::new(SheetsConfig::new(SheetsAuth::ApiKey("key".into())))?;
//! let sync = InvoiceSync::new(sheets, db.clone());
//! let report = sync
//!     .sync_invoices_from_source("spreadsheet-id", &SheetRange::for_sheet("P1"), 6, 2024)
//!     .await?;
//! println!("{} invoices written", report.processed_count);
//!
//! let zns = ZnsClient::new(ZnsConfig::new("access-token"))?;
//! let sender = InvoiceSender::new(db, Arc::new(zns), Arc::new(MemoryTrackingCache::new()));
//! let invoice = sender.send_invoice(1).await?;
//! println!("status {}", invoice.invoice_status.code());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod billing;
pub mod dispatch;
pub mod error;
pub mod manual;
pub mod parser;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod sync;
pub mod workflow;

pub use billing::{compute_manual, compute_synced, Bill, ELECTRICITY_UNIT_RATE};
pub use dispatch::{
    DispatchError, DispatchOutcome, DispatchRequest, MemoryTrackingCache, MessageDispatcher,
    TrackingCache,
};
pub use error::{InvoicingError, Result};
pub use manual::{create_manual_invoice, ManualInvoice};
pub use parser::{ColumnLayout, ParsedCustomer, ParsedRow, SheetLayout};
pub use reconcile::{ReconciliationEngine, RowOutcome};
pub use report::{get_invoice_report, ReportRow};
pub use source::{SheetRange, SourceError, SpreadsheetSource};
pub use sync::{InvoiceSync, SkippedEntry, SyncReport};
pub use workflow::{InvoiceSender, SendResult, DEFAULT_INVOICE_TEMPLATE_ID};
