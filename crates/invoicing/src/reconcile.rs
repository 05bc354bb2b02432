//! Business-key upsert of one decoded row.

use database::customer::{self, NewCustomer};
use database::models::{Electricity, InvoiceDraft};
use database::{apartment, invoice, room, Database, Invoice};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::billing::{compute_synced, Bill};
use crate::error::Result;
use crate::parser::{ParsedCustomer, ParsedRow};

/// What reconciling one row wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    pub customers_created: usize,
    pub customers_updated: usize,
    pub invoices_created: usize,
    pub invoices_updated: usize,
}

impl RowOutcome {
    /// Tenants whose invoice was written.
    pub fn processed(&self) -> usize {
        self.invoices_created + self.invoices_updated
    }
}

/// Upserts Apartment, Room, Customer and Invoice records from sheet rows.
///
/// Apartments are keyed by code, rooms by `(code, apartment)`, customers by
/// phone and invoices by `(room_code, customer_name, month, year)`. Lookups
/// and writes are separate statements, so two concurrent runs over the same
/// apartment can still insert duplicates.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    db: Database,
}

impl ReconciliationEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Reconcile one row into `apartment_code` for the given period.
    ///
    /// Writes are not grouped; an error midway leaves earlier tenants of the
    /// row written.
    pub async fn reconcile_row(
        &self,
        apartment_code: &str,
        row: &ParsedRow,
        month: i64,
        year: i64,
    ) -> Result<RowOutcome> {
        let pool = self.db.pool();
        let bill = compute_synced(&row.amounts)?;
        warn_on_sheet_totals(row, &bill);

        let apartment = apartment::find_or_create_apartment(pool, apartment_code).await?;
        let room = room::find_or_create_room(pool, &row.room_code, apartment.id).await?;

        let mut outcome = RowOutcome::default();

        for tenant in &row.customers {
            match customer::find_customer_by_phone(pool, &tenant.phone).await? {
                Some(existing) => {
                    customer::overwrite_synced_customer(
                        pool,
                        existing.id,
                        &tenant.name,
                        tenant.dob,
                        room.id,
                        apartment.id,
                    )
                    .await?;
                    outcome.customers_updated += 1;
                    debug!(customer_id = existing.id, name = %tenant.name, "Customer updated from sheet");
                }
                None => {
                    let created = customer::create_customer(
                        pool,
                        &NewCustomer {
                            uuid: None,
                            name: tenant.name.clone(),
                            phone: Some(tenant.phone.clone()),
                            dob: tenant.dob,
                            room_id: Some(room.id),
                            apartment_id: Some(apartment.id),
                        },
                    )
                    .await?;
                    outcome.customers_created += 1;
                    info!(customer_id = created.id, name = %tenant.name, "Customer created from sheet");
                }
            }

            let draft = build_draft(apartment_code, row, tenant, &bill, month, year);
            let (_, created) = self.upsert_invoice(&draft).await?;
            if created {
                outcome.invoices_created += 1;
            } else {
                outcome.invoices_updated += 1;
            }
        }

        Ok(outcome)
    }

    /// Insert the draft, or overwrite the invoice already stored under its key.
    ///
    /// Returns the invoice and whether it was created.
    pub async fn upsert_invoice(&self, draft: &InvoiceDraft) -> Result<(Invoice, bool)> {
        let pool = self.db.pool();

        match invoice::find_invoice_by_key(pool, &draft.key()).await? {
            Some(existing) => {
                let updated = invoice::overwrite_invoice(pool, existing.id, draft).await?;
                Ok((updated, false))
            }
            None => {
                let created = invoice::insert_invoice(pool, draft).await?;
                Ok((created, true))
            }
        }
    }
}

fn warn_on_sheet_totals(row: &ParsedRow, bill: &Bill) {
    let amounts = &row.amounts;
    if bill.total_amount != amounts.total_amount || bill.remaining_amount != amounts.remaining_amount
    {
        warn!(
            row = row.row_number,
            room_code = %row.room_code,
            sheet_total = amounts.total_amount,
            computed_total = bill.total_amount,
            sheet_remaining = amounts.remaining_amount,
            computed_remaining = bill.remaining_amount,
            "Sheet totals disagree with fee columns, using computed values"
        );
    }
}

/// Snapshot one tenant of a row into an invoice draft.
pub fn build_draft(
    apartment_code: &str,
    row: &ParsedRow,
    tenant: &ParsedCustomer,
    bill: &Bill,
    month: i64,
    year: i64,
) -> InvoiceDraft {
    let amounts = &row.amounts;

    InvoiceDraft {
        room_code: row.room_code.clone(),
        apartment_code: Some(apartment_code.to_string()),
        customer_name: tenant.name.clone(),
        gender: tenant.gender.clone(),
        birth_date: tenant.dob,
        phone: tenant.phone.clone(),
        contract: row.contract.clone(),
        deposit_amount: 0,
        room_price: amounts.room_price,
        stay_days: amounts.stay_days,
        actual_room_fee: bill.actual_room_fee,
        electricity: Electricity {
            old_index: amounts.old_index,
            new_index: amounts.new_index,
            used_kwh: bill.used_kwh,
            price: bill.electricity_price,
            staff: None,
        },
        water_usage: amounts.water_usage,
        water_fee: amounts.water_fee,
        management_fee: amounts.management_fee,
        old_debt: amounts.old_debt,
        deduction: amounts.deduction,
        total_amount: bill.total_amount,
        amount_paid: bill.amount_paid,
        remaining_amount: bill.remaining_amount,
        note: row.note.clone(),
        extra_note: String::new(),
        month,
        year,
    }
}
