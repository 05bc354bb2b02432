//! Sheet-to-store synchronisation for one billing period.

use database::validation::validate_period;
use database::Database;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{InvoicingError, Result};
use crate::parser::{parse_row, ColumnLayout, CustomerSkip, SheetLayout};
use crate::reconcile::ReconciliationEngine;
use crate::source::{SheetRange, SpreadsheetSource};

/// A row or tenant left out of a sync, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// 1-based sheet row.
    pub row: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub reason: String,
}

/// Summary of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Tenants whose invoice was created or overwritten.
    pub processed_count: usize,
    pub invoices_created: usize,
    pub invoices_updated: usize,
    pub skipped_rows: Vec<SkippedEntry>,
    pub skipped_customers: Vec<SkippedEntry>,
}

/// Pulls a sheet range and reconciles it row by row.
pub struct InvoiceSync<S: SpreadsheetSource> {
    source: S,
    engine: ReconciliationEngine,
    columns: ColumnLayout,
    layout: SheetLayout,
}

impl<S: SpreadsheetSource> InvoiceSync<S> {
    pub fn new(source: S, db: Database) -> Self {
        Self {
            source,
            engine: ReconciliationEngine::new(db),
            columns: ColumnLayout::default(),
            layout: SheetLayout::default(),
        }
    }

    pub fn with_columns(mut self, columns: ColumnLayout) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sync one range into the apartment named after its sheet tab.
    ///
    /// Rows run strictly in order, since a later row may reuse the room an
    /// earlier one created. Bad rows are skipped and reported; only a source
    /// failure aborts the run.
    pub async fn sync_invoices_from_source(
        &self,
        source_id: &str,
        range: &SheetRange,
        month: i64,
        year: i64,
    ) -> Result<SyncReport> {
        validate_period(month, year)?;
        range.validate().map_err(InvoicingError::Validation)?;
        if source_id.trim().is_empty() {
            return Err(InvoicingError::Validation("source id is required".to_string()));
        }

        let rows = self.source.fetch_rows(source_id, range).await?;
        let body = self.layout.body(&rows);
        info!(
            source_id = %source_id,
            sheet = %range.sheet_name,
            fetched = rows.len(),
            rows = body.len(),
            month,
            year,
            "Starting invoice sync"
        );

        let mut report = SyncReport::default();

        for (index, cells) in body.iter().enumerate() {
            let row_number = self.layout.row_number(range.start_row, index);

            let parsed = match parse_row(cells, &self.columns, row_number) {
                Ok(parsed) => parsed,
                Err(skip) => {
                    warn!(row = row_number, reason = %skip, "Skipping row");
                    report.skipped_rows.push(SkippedEntry {
                        row: row_number,
                        customer: None,
                        reason: skip.to_string(),
                    });
                    continue;
                }
            };

            for skip in &parsed.skipped {
                warn!(row = row_number, room_code = %parsed.room_code, reason = %skip, "Skipping customer");
                report.skipped_customers.push(SkippedEntry {
                    row: row_number,
                    customer: match skip {
                        CustomerSkip::InvalidPhone { name, .. } => Some(name.clone()),
                        CustomerSkip::BlankName { .. } => None,
                    },
                    reason: skip.to_string(),
                });
            }

            match self
                .engine
                .reconcile_row(&range.sheet_name, &parsed, month, year)
                .await
            {
                Ok(outcome) => {
                    report.processed_count += outcome.processed();
                    report.invoices_created += outcome.invoices_created;
                    report.invoices_updated += outcome.invoices_updated;
                }
                Err(e) => {
                    warn!(row = row_number, room_code = %parsed.room_code, error = %e, "Row failed, skipping");
                    report.skipped_rows.push(SkippedEntry {
                        row: row_number,
                        customer: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed_count,
            skipped_rows = report.skipped_rows.len(),
            skipped_customers = report.skipped_customers.len(),
            "Invoice sync finished"
        );

        Ok(report)
    }
}
