//! Google Sheets values client.
//!
//! Reads rectangular ranges of a spreadsheet as rows of cell text.
//!
//! # Example
//!
//! ```no_run
//! use sheet_source::{SheetRange, SheetsAuth, SheetsClient, SheetsConfig};
//!
//! # async fn example() -> Result<(), sheet_source::SheetsError> {
//! let client = SheetsClient::new(SheetsConfig::new(SheetsAuth::AccessToken("ya29...".into())))?;
//! let rows = client
//!     .fetch_values("1Vuv-Vv-BXuj4iLo6gMPqnvgU2JwzXPDxbCzNrftk8Cs", &SheetRange::for_sheet("P1"))
//!     .await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod range;

pub use client::SheetsClient;
pub use config::{SheetsAuth, SheetsConfig};
pub use error::SheetsError;
pub use range::SheetRange;
