//! Invoice send workflow.
//!
//! Each send is one dispatch attempt. Its outcome moves the invoice to
//! `Sent` or `Failed` and appends one history entry. Nothing guards against
//! re-sending a sent invoice.

use std::sync::Arc;
use std::time::Duration;

use database::{invoice, Database, Invoice, InvoiceStatus};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::billing::ELECTRICITY_UNIT_RATE;
use crate::dispatch::{DispatchOutcome, DispatchRequest, MessageDispatcher, TrackingCache};
use crate::error::{InvoicingError, Result};
use crate::parser::normalize_phone;

/// Template used for invoice messages unless configured otherwise.
pub const DEFAULT_INVOICE_TEMPLATE_ID: &str = "420761";

/// How long the tracking cache keeps the phone of a dispatched invoice.
pub const TRACKING_TTL: Duration = Duration::from_secs(3600);

const INVOICE_TYPE: &str = "Hóa đơn";
const PAYMENT_NOTE: &str = "Vui lòng chuyển đúng nội dung và thanh toán vào ngày 01, hạn cuối là ngày 05. Xin cảm ơn quý khách!";

/// Per-invoice result of a bulk send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub invoice_id: i64,
    /// Status after the attempt; `None` when no attempt was made.
    pub status: Option<InvoiceStatus>,
    pub message: String,
}

/// Tracking ID attached to an invoice dispatch.
pub fn tracking_id(invoice_id: i64) -> String {
    format!("invoice_{}", invoice_id)
}

/// Render an amount with `.` thousands separators and a `đ` suffix.
pub fn format_vnd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-{}đ", grouped)
    } else {
        format!("{}đ", grouped)
    }
}

/// Template fields of an invoice message.
pub fn invoice_fields(invoice: &Invoice) -> Map<String, Value> {
    let electricity = &invoice.electricity;
    let fields = json!({
        "transfer_amount": invoice.total_amount,
        "bank_transfer_note": format!("{} {} {}", invoice.room_code, invoice.month, invoice.year),
        "typeInvoice": INVOICE_TYPE,
        "billingMonth": format!("{}/{}", invoice.month, invoice.year),
        "tenantName": invoice.customer_name,
        "roomCode": invoice.room_code,
        "rentPrice": format_vnd(invoice.room_price),
        // Always quotes the manual tariff; a synced price may have used another.
        "electricityCost": format!(
            "{} - {} = {} * {} = {}",
            electricity.new_index,
            electricity.old_index,
            electricity.used_kwh,
            ELECTRICITY_UNIT_RATE,
            format_vnd(electricity.price)
        ),
        "waterCost": format_vnd(invoice.water_fee),
        "serviceFee": format_vnd(invoice.management_fee),
        "oldDebt": format_vnd(invoice.old_debt),
        "deductions": format_vnd(invoice.deduction),
        "totalCost": format_vnd(invoice.total_amount),
        "invoiceNote": PAYMENT_NOTE,
    });

    match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Sends invoices through a [`MessageDispatcher`] and records the outcome.
#[derive(Clone)]
pub struct InvoiceSender {
    db: Database,
    dispatcher: Arc<dyn MessageDispatcher>,
    cache: Arc<dyn TrackingCache>,
    template_id: String,
}

impl InvoiceSender {
    pub fn new(
        db: Database,
        dispatcher: Arc<dyn MessageDispatcher>,
        cache: Arc<dyn TrackingCache>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            cache,
            template_id: DEFAULT_INVOICE_TEMPLATE_ID.to_string(),
        }
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = template_id.into();
        self
    }

    /// Dispatch one invoice and record the result.
    ///
    /// A rejected or failed dispatch is not an error: the invoice comes back
    /// with status `Failed` and the reason in `invoice_message`.
    pub async fn send_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        let invoice = invoice::get_invoice(self.db.pool(), invoice_id).await?;

        let phone = normalize_phone(&invoice.phone);
        let tracking = tracking_id(invoice.id);
        self.cache.set_with_expiry(&tracking, &phone, TRACKING_TTL);

        let request = DispatchRequest {
            phone: phone.clone(),
            template_id: self.template_id.clone(),
            fields: invoice_fields(&invoice),
            tracking_id: Some(tracking),
        };

        let outcome = match self.dispatcher.send(&request).await {
            Ok(outcome) => outcome,
            Err(e) => DispatchOutcome::failed(e.to_string()),
        };

        let status = if outcome.success {
            info!(invoice_id, phone = %phone, "Invoice sent");
            InvoiceStatus::Sent
        } else {
            warn!(invoice_id, phone = %phone, reason = %outcome.message, "Invoice dispatch failed");
            InvoiceStatus::Failed
        };

        let updated = invoice::record_dispatch(self.db.pool(), invoice_id, status, &outcome.message).await?;
        Ok(updated)
    }

    /// Send each invoice independently, in order.
    ///
    /// One invoice's failure never stops the others. Unknown IDs get a
    /// `not found` result.
    pub async fn send_invoices_bulk(&self, invoice_ids: &[i64]) -> Result<Vec<SendResult>> {
        if invoice_ids.is_empty() {
            return Err(InvoicingError::Validation(
                "invoice_ids must not be empty".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(invoice_ids.len());

        for &invoice_id in invoice_ids {
            let result = match self.send_invoice(invoice_id).await {
                Ok(invoice) => SendResult {
                    invoice_id,
                    status: Some(invoice.invoice_status),
                    message: invoice.invoice_message.unwrap_or_default(),
                },
                Err(e) if e.is_not_found() => SendResult {
                    invoice_id,
                    status: None,
                    message: "not found".to_string(),
                },
                Err(e) => {
                    warn!(invoice_id, error = %e, "Invoice send aborted");
                    SendResult {
                        invoice_id,
                        status: None,
                        message: e.to_string(),
                    }
                }
            };
            results.push(result);
        }

        info!(
            requested = invoice_ids.len(),
            sent = results
                .iter()
                .filter(|r| r.status == Some(InvoiceStatus::Sent))
                .count(),
            "Bulk invoice send finished"
        );

        Ok(results)
    }
}

impl std::fmt::Debug for InvoiceSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceSender")
            .field("template_id", &self.template_id)
            .finish()
    }
}
