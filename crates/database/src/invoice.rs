//! Invoice persistence: natural-key lookup, field overwrite and send history.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{HistoryEntry, Invoice, InvoiceDraft, InvoiceKey, InvoiceStatus};
use crate::validation::like_pattern;

const INVOICE_COLUMNS: &str = r#"
    id, room_code, apartment_code, customer_name, gender, birth_date, phone,
    contract_start_date, contract_end_date, contract_duration_months,
    deposit_amount, room_price, stay_days, actual_room_fee,
    old_index, new_index, used_kwh, electricity_price, electricity_staff,
    water_usage, water_fee, management_fee, old_debt, deduction,
    total_amount, amount_paid, remaining_amount, note, extra_note,
    invoice_status, invoice_message, month, year, created_at, updated_at
"#;

/// Filter for listing invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub apartment_code: Option<String>,
    /// Billing period; applied only when both parts are set.
    pub month: Option<i64>,
    pub year: Option<i64>,
    /// Keep only periods strictly before this `(month, year)`.
    pub before: Option<(i64, i64)>,
    /// Case-insensitive substring match on customer name, phone or room code.
    pub search: Option<String>,
}

/// Insert a new invoice with status pending and an empty history.
pub async fn insert_invoice(pool: &SqlitePool, draft: &InvoiceDraft) -> Result<Invoice> {
    let result = sqlx::query(
        r#"
        INSERT INTO invoices (
            room_code, apartment_code, customer_name, gender, birth_date, phone,
            contract_start_date, contract_end_date, contract_duration_months,
            deposit_amount, room_price, stay_days, actual_room_fee,
            old_index, new_index, used_kwh, electricity_price, electricity_staff,
            water_usage, water_fee, management_fee, old_debt, deduction,
            total_amount, amount_paid, remaining_amount, note, extra_note,
            invoice_status, invoice_message, month, year
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(&draft.room_code)
    .bind(&draft.apartment_code)
    .bind(&draft.customer_name)
    .bind(&draft.gender)
    .bind(draft.birth_date)
    .bind(&draft.phone)
    .bind(draft.contract.start_date)
    .bind(draft.contract.end_date)
    .bind(draft.contract.duration_months)
    .bind(draft.deposit_amount)
    .bind(draft.room_price)
    .bind(draft.stay_days)
    .bind(draft.actual_room_fee)
    .bind(draft.electricity.old_index)
    .bind(draft.electricity.new_index)
    .bind(draft.electricity.used_kwh)
    .bind(draft.electricity.price)
    .bind(&draft.electricity.staff)
    .bind(draft.water_usage)
    .bind(draft.water_fee)
    .bind(draft.management_fee)
    .bind(draft.old_debt)
    .bind(draft.deduction)
    .bind(draft.total_amount)
    .bind(draft.amount_paid)
    .bind(draft.remaining_amount)
    .bind(&draft.note)
    .bind(&draft.extra_note)
    .bind(InvoiceStatus::Pending)
    .bind(draft.month)
    .bind(draft.year)
    .execute(pool)
    .await?;

    tracing::info!(
        room_code = %draft.room_code,
        customer = %draft.customer_name,
        month = draft.month,
        year = draft.year,
        "Invoice created"
    );

    get_invoice(pool, result.last_insert_rowid()).await
}

/// Get an invoice by ID, including its history.
pub async fn get_invoice(pool: &SqlitePool, id: i64) -> Result<Invoice> {
    let mut invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {} FROM invoices WHERE id = ?",
        INVOICE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

    invoice.history = get_history(pool, id).await?;
    Ok(invoice)
}

/// Find the invoice stored under a natural key. The oldest match wins.
pub async fn find_invoice_by_key(pool: &SqlitePool, key: &InvoiceKey) -> Result<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        r#"
        SELECT {}
        FROM invoices
        WHERE room_code = ? AND customer_name = ? AND month = ? AND year = ?
        ORDER BY id
        LIMIT 1
        "#,
        INVOICE_COLUMNS
    ))
    .bind(&key.room_code)
    .bind(&key.customer_name)
    .bind(key.month)
    .bind(key.year)
    .fetch_optional(pool)
    .await?;

    match invoice {
        Some(mut invoice) => {
            invoice.history = get_history(pool, invoice.id).await?;
            Ok(Some(invoice))
        }
        None => Ok(None),
    }
}

/// Overwrite every raw and computed field of an invoice.
///
/// Status, `invoice_message` and history are left untouched.
pub async fn overwrite_invoice(pool: &SqlitePool, id: i64, draft: &InvoiceDraft) -> Result<Invoice> {
    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET room_code = ?, apartment_code = ?, customer_name = ?, gender = ?, birth_date = ?,
            phone = ?, contract_start_date = ?, contract_end_date = ?,
            contract_duration_months = ?, deposit_amount = ?, room_price = ?, stay_days = ?,
            actual_room_fee = ?, old_index = ?, new_index = ?, used_kwh = ?,
            electricity_price = ?, electricity_staff = ?, water_usage = ?, water_fee = ?,
            management_fee = ?, old_debt = ?, deduction = ?, total_amount = ?,
            amount_paid = ?, remaining_amount = ?, note = ?, extra_note = ?,
            month = ?, year = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&draft.room_code)
    .bind(&draft.apartment_code)
    .bind(&draft.customer_name)
    .bind(&draft.gender)
    .bind(draft.birth_date)
    .bind(&draft.phone)
    .bind(draft.contract.start_date)
    .bind(draft.contract.end_date)
    .bind(draft.contract.duration_months)
    .bind(draft.deposit_amount)
    .bind(draft.room_price)
    .bind(draft.stay_days)
    .bind(draft.actual_room_fee)
    .bind(draft.electricity.old_index)
    .bind(draft.electricity.new_index)
    .bind(draft.electricity.used_kwh)
    .bind(draft.electricity.price)
    .bind(&draft.electricity.staff)
    .bind(draft.water_usage)
    .bind(draft.water_fee)
    .bind(draft.management_fee)
    .bind(draft.old_debt)
    .bind(draft.deduction)
    .bind(draft.total_amount)
    .bind(draft.amount_paid)
    .bind(draft.remaining_amount)
    .bind(&draft.note)
    .bind(&draft.extra_note)
    .bind(draft.month)
    .bind(draft.year)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Invoice", id));
    }

    tracing::debug!(invoice_id = id, "Invoice overwritten");
    get_invoice(pool, id).await
}

/// Record the outcome of one dispatch attempt.
///
/// Sets the status and `invoice_message` and appends one history entry, atomically.
pub async fn record_dispatch(
    pool: &SqlitePool,
    id: i64,
    status: InvoiceStatus,
    message: &str,
) -> Result<Invoice> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET invoice_status = ?, invoice_message = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(message)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Invoice", id));
    }

    sqlx::query(
        r#"
        INSERT INTO invoice_history (invoice_id, status, message)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(message)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_invoice(pool, id).await
}

/// Send history of an invoice, oldest first.
pub async fn get_history(pool: &SqlitePool, invoice_id: i64) -> Result<Vec<HistoryEntry>> {
    let history = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT status, message, created_at
        FROM invoice_history
        WHERE invoice_id = ?
        ORDER BY id
        "#,
    )
    .bind(invoice_id)
    .fetch_all(pool)
    .await?;

    Ok(history)
}

/// Load the invoices with the given IDs, in the order given. Unknown IDs are omitted.
pub async fn get_invoices_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Invoice>> {
    let mut invoices = Vec::with_capacity(ids.len());
    for &id in ids {
        match get_invoice(pool, id).await {
            Ok(invoice) => invoices.push(invoice),
            Err(DatabaseError::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(invoices)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &InvoiceFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(code) = &filter.apartment_code {
        builder.push(" AND apartment_code = ").push_bind(code.clone());
    }
    if let (Some(month), Some(year)) = (filter.month, filter.year) {
        builder
            .push(" AND month = ")
            .push_bind(month)
            .push(" AND year = ")
            .push_bind(year);
    }
    if let Some((month, year)) = filter.before {
        builder
            .push(" AND (year < ")
            .push_bind(year)
            .push(" OR (year = ")
            .push_bind(year)
            .push(" AND month < ")
            .push_bind(month)
            .push("))");
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR phone LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR room_code LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// List invoices matching a filter, newest first. History is not loaded.
pub async fn list_invoices(pool: &SqlitePool, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM invoices", INVOICE_COLUMNS));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id DESC");

    let invoices = builder.build_query_as::<Invoice>().fetch_all(pool).await?;
    Ok(invoices)
}

/// Count invoices matching a filter.
pub async fn count_matching_invoices(pool: &SqlitePool, filter: &InvoiceFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
    push_filter(&mut builder, filter);

    let count = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

/// All invoices of one billing period with their history, ordered by room then customer.
pub async fn list_invoices_for_period(
    pool: &SqlitePool,
    month: i64,
    year: i64,
) -> Result<Vec<Invoice>> {
    let mut invoices = sqlx::query_as::<_, Invoice>(&format!(
        r#"
        SELECT {}
        FROM invoices
        WHERE month = ? AND year = ?
        ORDER BY room_code, customer_name, id
        "#,
        INVOICE_COLUMNS
    ))
    .bind(month)
    .bind(year)
    .fetch_all(pool)
    .await?;

    for invoice in &mut invoices {
        invoice.history = get_history(pool, invoice.id).await?;
    }

    Ok(invoices)
}

/// Count total invoices.
pub async fn count_invoices(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
