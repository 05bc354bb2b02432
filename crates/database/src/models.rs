//! Database models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A building, identified by its unique `code` (the sheet tab name for synced data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Apartment {
    pub id: i64,
    /// Unique business code.
    pub code: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A room inside exactly one apartment. `(code, apartment_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub code: String,
    pub apartment_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A tenant, optionally placed in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    /// External business identifier. Absent for customers created by sheet sync.
    pub uuid: Option<String>,
    pub name: String,
    /// Phone number; sync stores the international form (`84...`).
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub room_id: Option<i64>,
    pub apartment_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Send status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum InvoiceStatus {
    Pending = 1,
    Sent = 2,
    Paid = 3,
    Failed = 4,
}

impl InvoiceStatus {
    /// Numeric code as stored and reported.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<InvoiceStatus> for i32 {
    fn from(status: InvoiceStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for InvoiceStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InvoiceStatus::Pending),
            2 => Ok(InvoiceStatus::Sent),
            3 => Ok(InvoiceStatus::Paid),
            4 => Ok(InvoiceStatus::Failed),
            other => Err(format!("unknown invoice status: {}", other)),
        }
    }
}

/// Contract terms copied onto an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contract {
    #[sqlx(rename = "contract_start_date")]
    pub start_date: Option<NaiveDate>,
    #[sqlx(rename = "contract_end_date")]
    pub end_date: Option<NaiveDate>,
    #[sqlx(rename = "contract_duration_months")]
    pub duration_months: i64,
}

/// Electricity meter sub-record of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Electricity {
    pub old_index: i64,
    pub new_index: i64,
    pub used_kwh: i64,
    #[sqlx(rename = "electricity_price")]
    pub price: i64,
    #[sqlx(rename = "electricity_staff")]
    pub staff: Option<String>,
}

/// One append-only entry in an invoice's send history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub status: InvoiceStatus,
    pub message: String,
    pub created_at: String,
}

/// A customer's bill for one `(month, year)` period.
///
/// `room_code`, `apartment_code` and `customer_name` are a snapshot taken when
/// the invoice was written, not references to Room or Customer rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub room_code: String,
    pub apartment_code: Option<String>,
    pub customer_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    #[sqlx(flatten)]
    pub contract: Contract,
    pub deposit_amount: i64,
    pub room_price: i64,
    pub stay_days: i64,
    pub actual_room_fee: i64,
    #[sqlx(flatten)]
    pub electricity: Electricity,
    pub water_usage: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub old_debt: i64,
    pub deduction: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub remaining_amount: i64,
    pub note: String,
    pub extra_note: String,
    pub invoice_status: InvoiceStatus,
    pub invoice_message: Option<String>,
    pub month: i64,
    pub year: i64,
    /// Loaded separately, oldest first.
    #[sqlx(skip)]
    pub history: Vec<HistoryEntry>,
    pub created_at: String,
    pub updated_at: String,
}

impl Invoice {
    /// Natural key of this invoice.
    pub fn key(&self) -> InvoiceKey {
        InvoiceKey {
            room_code: self.room_code.clone(),
            customer_name: self.customer_name.clone(),
            month: self.month,
            year: self.year,
        }
    }

    /// Most recent history entry, if any.
    pub fn latest_history(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

/// Business key used to match invoices during sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceKey {
    pub room_code: String,
    pub customer_name: String,
    pub month: i64,
    pub year: i64,
}

/// Every field of an invoice except identity, status, message and history.
///
/// Used both to insert a new invoice and to overwrite an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub room_code: String,
    pub apartment_code: Option<String>,
    pub customer_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub contract: Contract,
    pub deposit_amount: i64,
    pub room_price: i64,
    pub stay_days: i64,
    pub actual_room_fee: i64,
    pub electricity: Electricity,
    pub water_usage: i64,
    pub water_fee: i64,
    pub management_fee: i64,
    pub old_debt: i64,
    pub deduction: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub remaining_amount: i64,
    pub note: String,
    pub extra_note: String,
    pub month: i64,
    pub year: i64,
}

impl InvoiceDraft {
    /// Natural key this draft will be stored under.
    pub fn key(&self) -> InvoiceKey {
        InvoiceKey {
            room_code: self.room_code.clone(),
            customer_name: self.customer_name.clone(),
            month: self.month,
            year: self.year,
        }
    }
}

/// A broadcast to a set of apartments and rooms with its delivery log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[sqlx(skip)]
    pub apartment_ids: Vec<i64>,
    #[sqlx(skip)]
    pub room_ids: Vec<i64>,
    #[sqlx(skip)]
    pub logs: Vec<DeliveryLog>,
    pub created_at: String,
}

/// Outcome of delivering a notification to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryLog {
    pub customer_name: String,
    pub customer_phone: String,
    pub message: String,
    pub result: String,
}
