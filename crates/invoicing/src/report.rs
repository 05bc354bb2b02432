//! Flattened per-period invoice report.

use database::validation::validate_period;
use database::{invoice, Database, Invoice, InvoiceStatus};
use serde::Serialize;

use crate::error::Result;

/// One invoice of the report with its latest send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub invoice_id: i64,
    pub customer_name: String,
    pub phone: String,
    pub room_code: String,
    pub room_price: i64,
    pub actual_room_fee: i64,
    pub electricity_fee: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub remaining_amount: i64,
    pub invoice_status: InvoiceStatus,
    pub invoice_message: Option<String>,
    pub latest_send_status: Option<InvoiceStatus>,
    pub latest_send_message: Option<String>,
    pub latest_send_time: Option<String>,
}

impl From<Invoice> for ReportRow {
    fn from(invoice: Invoice) -> Self {
        let latest = invoice.latest_history().cloned();
        Self {
            invoice_id: invoice.id,
            customer_name: invoice.customer_name,
            phone: invoice.phone,
            room_code: invoice.room_code,
            room_price: invoice.room_price,
            actual_room_fee: invoice.actual_room_fee,
            electricity_fee: invoice.electricity.price,
            water_fee: invoice.water_fee,
            management_fee: invoice.management_fee,
            total_amount: invoice.total_amount,
            amount_paid: invoice.amount_paid,
            remaining_amount: invoice.remaining_amount,
            invoice_status: invoice.invoice_status,
            invoice_message: invoice.invoice_message,
            latest_send_status: latest.as_ref().map(|entry| entry.status),
            latest_send_message: latest.as_ref().map(|entry| entry.message.clone()),
            latest_send_time: latest.map(|entry| entry.created_at),
        }
    }
}

/// Report rows for every invoice of a period, ordered by room then customer.
pub async fn get_invoice_report(db: &Database, month: i64, year: i64) -> Result<Vec<ReportRow>> {
    validate_period(month, year)?;

    let invoices = invoice::list_invoices_for_period(db.pool(), month, year).await?;
    tracing::debug!(month, year, invoices = invoices.len(), "Building invoice report");

    Ok(invoices.into_iter().map(ReportRow::from).collect())
}
