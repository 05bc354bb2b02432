//! Manually entered invoices.

use chrono::NaiveDate;
use database::validation::{validate_period, validate_required, MAX_NAME_LENGTH};
use database::{invoice, Contract, Database, Electricity, Invoice, InvoiceDraft};
use serde::{Deserialize, Serialize};

use crate::billing::{compute_manual, ManualCharges};
use crate::error::{InvoicingError, Result};

fn default_gender() -> String {
    "Nam".to_string()
}

fn default_stay_days() -> i64 {
    30
}

/// Input of a manually created invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualInvoice {
    pub room_code: String,
    #[serde(default)]
    pub apartment_code: Option<String>,
    pub customer_name: String,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    #[serde(default)]
    pub contract: Contract,
    #[serde(default)]
    pub deposit_amount: i64,
    #[serde(default)]
    pub room_price: i64,
    #[serde(default = "default_stay_days")]
    pub stay_days: i64,
    #[serde(default)]
    pub actual_room_fee: Option<i64>,
    #[serde(default)]
    pub old_index: i64,
    #[serde(default)]
    pub new_index: i64,
    #[serde(default)]
    pub electricity_staff: Option<String>,
    #[serde(default)]
    pub water_usage: i64,
    #[serde(default)]
    pub water_fee: i64,
    #[serde(default)]
    pub management_fee: i64,
    #[serde(default)]
    pub old_debt: i64,
    #[serde(default)]
    pub deduction: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub extra_note: String,
    pub month: i64,
    pub year: i64,
}

impl ManualInvoice {
    /// An invoice with only its identifying fields set.
    pub fn new(
        room_code: impl Into<String>,
        customer_name: impl Into<String>,
        phone: impl Into<String>,
        month: i64,
        year: i64,
    ) -> Self {
        Self {
            room_code: room_code.into(),
            apartment_code: None,
            customer_name: customer_name.into(),
            gender: default_gender(),
            birth_date: None,
            phone: phone.into(),
            contract: Contract::default(),
            deposit_amount: 0,
            room_price: 0,
            stay_days: default_stay_days(),
            actual_room_fee: None,
            old_index: 0,
            new_index: 0,
            electricity_staff: None,
            water_usage: 0,
            water_fee: 0,
            management_fee: 0,
            old_debt: 0,
            deduction: 0,
            note: String::new(),
            extra_note: String::new(),
            month,
            year,
        }
    }
}

/// Validate, bill at the fixed unit rate and store as a pending invoice.
pub async fn create_manual_invoice(db: &Database, input: &ManualInvoice) -> Result<Invoice> {
    validate_period(input.month, input.year)?;
    let room_code = validate_required("room_code", &input.room_code, MAX_NAME_LENGTH)?;
    let customer_name = validate_required("customer_name", &input.customer_name, MAX_NAME_LENGTH)?;
    let phone = input.phone.trim();
    if phone.is_empty() {
        return Err(InvoicingError::Validation("phone is required".to_string()));
    }

    let bill = compute_manual(&ManualCharges {
        room_price: input.room_price,
        actual_room_fee: input.actual_room_fee,
        old_index: input.old_index,
        new_index: input.new_index,
        water_fee: input.water_fee,
        management_fee: input.management_fee,
        old_debt: input.old_debt,
        deduction: input.deduction,
    })?;

    let draft = InvoiceDraft {
        room_code: room_code.to_string(),
        apartment_code: input.apartment_code.clone(),
        customer_name: customer_name.to_string(),
        gender: input.gender.clone(),
        birth_date: input.birth_date,
        phone: phone.to_string(),
        contract: input.contract.clone(),
        deposit_amount: input.deposit_amount,
        room_price: input.room_price,
        stay_days: input.stay_days,
        actual_room_fee: bill.actual_room_fee,
        electricity: Electricity {
            old_index: input.old_index,
            new_index: input.new_index,
            used_kwh: bill.used_kwh,
            price: bill.electricity_price,
            staff: input.electricity_staff.clone(),
        },
        water_usage: input.water_usage,
        water_fee: input.water_fee,
        management_fee: input.management_fee,
        old_debt: input.old_debt,
        deduction: input.deduction,
        total_amount: bill.total_amount,
        amount_paid: bill.amount_paid,
        remaining_amount: bill.remaining_amount,
        note: input.note.clone(),
        extra_note: input.extra_note.clone(),
        month: input.month,
        year: input.year,
    };

    let invoice = invoice::insert_invoice(db.pool(), &draft).await?;
    Ok(invoice)
}
