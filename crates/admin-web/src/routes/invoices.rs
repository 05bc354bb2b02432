//! Invoice endpoints: listing, manual entry, delivery, reporting and sync.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Datelike;
use database::invoice::{self, InvoiceFilter};
use invoicing::{create_manual_invoice, get_invoice_report, ManualInvoice, SheetRange};
use serde::Deserialize;

use crate::error::{AdminError, Result};
use crate::response::{created, ok, Listing};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub apartment_code: Option<String>,
    pub month: Option<i64>,
    pub year: Option<i64>,
    pub search: Option<String>,
    pub before_month: Option<i64>,
    pub before_year: Option<i64>,
}

impl From<InvoiceQuery> for InvoiceFilter {
    fn from(query: InvoiceQuery) -> Self {
        InvoiceFilter {
            apartment_code: query.apartment_code.filter(|code| !code.trim().is_empty()),
            month: query.month,
            year: query.year,
            before: query.before_month.zip(query.before_year),
            search: query.search,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub month: Option<i64>,
    pub year: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkSend {
    #[serde(default)]
    pub invoice_ids: Vec<i64>,
}

/// Range fields a sync request may override.
#[derive(Debug, Default, Deserialize)]
pub struct RangeInput {
    pub sheet_name: Option<String>,
    pub start_row: Option<u32>,
    pub end_row: Option<u32>,
    pub start_column: Option<String>,
    pub end_column: Option<String>,
}

impl RangeInput {
    fn into_range(self) -> SheetRange {
        let defaults = SheetRange::default();
        SheetRange {
            sheet_name: self.sheet_name.unwrap_or(defaults.sheet_name),
            start_row: self.start_row.unwrap_or(defaults.start_row),
            end_row: self.end_row.unwrap_or(defaults.end_row),
            start_column: self.start_column.unwrap_or(defaults.start_column),
            end_column: self.end_column.unwrap_or(defaults.end_column),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub range: RangeInput,
    pub month: Option<i64>,
    pub year: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> Result<Response> {
    let filter = InvoiceFilter::from(query);
    let pool = state.db.pool();

    let rows = invoice::list_invoices(pool, &filter).await?;
    let total = invoice::count_matching_invoices(pool, &filter).await?;
    Ok(ok("Invoices loaded", Listing { rows, total }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ManualInvoice>,
) -> Result<Response> {
    let stored = create_manual_invoice(&state.db, &input).await?;
    Ok(created("Invoice created", stored))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let found = invoice::get_invoice(state.db.pool(), id).await?;
    Ok(ok("Invoice loaded", found))
}

pub async fn send_one(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let sent = state.sender.send_invoice(id).await?;
    let message = sent.invoice_message.clone().unwrap_or_default();
    Ok(ok(message, sent))
}

pub async fn send_bulk(
    State(state): State<AppState>,
    Json(input): Json<BulkSend>,
) -> Result<Response> {
    let results = state.sender.send_invoices_bulk(&input.invoice_ids).await?;
    Ok(ok("Invoices processed", results))
}

pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let (Some(month), Some(year)) = (query.month, query.year) else {
        return Err(AdminError::BadRequest(
            "month and year are required".to_string(),
        ));
    };

    let rows = get_invoice_report(&state.db, month, year).await?;
    Ok(ok("Invoice report loaded", rows))
}

/// Pull a sheet range into the store. Missing period parts default to today.
pub async fn sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Response> {
    let spreadsheet_id = request
        .spreadsheet_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| state.default_spreadsheet_id.clone())
        .ok_or_else(|| AdminError::BadRequest("spreadsheet_id is required".to_string()))?;

    let today = chrono::Local::now().date_naive();
    let month = request.month.unwrap_or_else(|| i64::from(today.month()));
    let year = request.year.unwrap_or_else(|| i64::from(today.year()));
    let range = request.range.into_range();

    let report = state
        .sync
        .sync_invoices_from_source(&spreadsheet_id, &range, month, year)
        .await?;
    Ok(ok("Invoices synced", report))
}
