//! Customer CRUD operations and room assignment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::apartment::get_apartment;
use crate::error::{DatabaseError, Result};
use crate::models::Customer;
use crate::room::get_room;
use crate::validation::{
    like_pattern, normalize_phone, validate_required, ValidationError, MAX_NAME_LENGTH,
};

const CUSTOMER_COLUMNS: &str =
    "id, uuid, name, phone, dob, room_id, apartment_id, created_at, updated_at";

/// Fields for creating a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub uuid: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub room_id: Option<i64>,
    pub apartment_id: Option<i64>,
}

/// Partial update of a customer. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<NaiveDate>,
    pub room_id: Option<i64>,
    pub apartment_id: Option<i64>,
}

/// Filter for listing customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFilter {
    /// Case-insensitive substring match on name or phone.
    pub search: Option<String>,
    pub room_id: Option<i64>,
    pub apartment_id: Option<i64>,
}

/// Resolve the apartment a customer ends up in, checking that room and apartment agree.
async fn resolve_placement(
    pool: &SqlitePool,
    room_id: Option<i64>,
    apartment_id: Option<i64>,
) -> Result<Option<i64>> {
    let room = match room_id {
        Some(room_id) => Some(get_room(pool, room_id).await?),
        None => None,
    };
    if let Some(apartment_id) = apartment_id {
        get_apartment(pool, apartment_id).await?;
    }

    match (room, apartment_id) {
        (Some(room), Some(apartment_id)) if room.apartment_id != apartment_id => {
            Err(ValidationError::RoomApartmentMismatch {
                room_id: room.id,
                apartment_id,
            }
            .into())
        }
        (Some(room), None) => Ok(Some(room.apartment_id)),
        (_, apartment_id) => Ok(apartment_id),
    }
}

/// Normalized phone, or `None` for a blank one.
fn stored_phone(phone: Option<&str>) -> Option<String> {
    phone
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(normalize_phone)
}

/// Create a customer, deriving the apartment from the room when only a room is given.
pub async fn create_customer(pool: &SqlitePool, customer: &NewCustomer) -> Result<Customer> {
    let name = validate_required("name", &customer.name, MAX_NAME_LENGTH)?;

    if let Some(uuid) = customer.uuid.as_deref() {
        let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE uuid = ?")
            .bind(uuid)
            .fetch_one(pool)
            .await?;
        if taken > 0 {
            return Err(DatabaseError::AlreadyExists {
                entity: "Customer",
                id: uuid.to_string(),
            });
        }
    }

    let apartment_id = resolve_placement(pool, customer.room_id, customer.apartment_id).await?;
    let phone = stored_phone(customer.phone.as_deref());

    let result = sqlx::query(
        r#"
        INSERT INTO customers (uuid, name, phone, dob, room_id, apartment_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&customer.uuid)
    .bind(name)
    .bind(phone)
    .bind(customer.dob)
    .bind(customer.room_id)
    .bind(apartment_id)
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::from_insert(e, "Customer", customer.uuid.as_deref().unwrap_or(name))
    })?;

    tracing::debug!(name = %name, "Customer created");
    get_customer(pool, result.last_insert_rowid()).await
}

/// Get a customer by ID.
pub async fn get_customer(pool: &SqlitePool, id: i64) -> Result<Customer> {
    sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE id = ?",
        CUSTOMER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Customer", id))
}

/// Find the oldest customer with this phone number, in either local or international form.
pub async fn find_customer_by_phone(pool: &SqlitePool, phone: &str) -> Result<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE phone = ? ORDER BY id LIMIT 1",
        CUSTOMER_COLUMNS
    ))
    .bind(normalize_phone(phone))
    .fetch_optional(pool)
    .await?;

    Ok(customer)
}

/// Apply a partial update to a customer.
///
/// Changing only the room moves the customer into that room's apartment.
/// A room and apartment that do not belong together are rejected.
pub async fn update_customer(
    pool: &SqlitePool,
    id: i64,
    update: &CustomerUpdate,
) -> Result<Customer> {
    let current = get_customer(pool, id).await?;

    let name = match update.name.as_deref() {
        Some(name) => validate_required("name", name, MAX_NAME_LENGTH)?.to_string(),
        None => current.name,
    };
    let phone = match update.phone.as_deref() {
        Some(phone) => stored_phone(Some(phone)),
        None => current.phone,
    };

    let room_id = update.room_id.or(current.room_id);
    let requested_apartment = match (update.room_id, update.apartment_id) {
        (_, Some(apartment_id)) => Some(apartment_id),
        (Some(_), None) => None,
        (None, None) => current.apartment_id,
    };
    let apartment_id = resolve_placement(pool, room_id, requested_apartment).await?;

    sqlx::query(
        r#"
        UPDATE customers
        SET name = ?, phone = ?, dob = ?, room_id = ?, apartment_id = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(phone)
    .bind(update.dob.or(current.dob))
    .bind(room_id)
    .bind(apartment_id)
    .bind(id)
    .execute(pool)
    .await?;

    get_customer(pool, id).await
}

/// Overwrite the synced attributes of a customer found by phone.
///
/// Unlike [`update_customer`], an absent `dob` clears the stored value.
pub async fn overwrite_synced_customer(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    dob: Option<NaiveDate>,
    room_id: i64,
    apartment_id: i64,
) -> Result<Customer> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET name = ?, dob = ?, room_id = ?, apartment_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(dob)
    .bind(room_id)
    .bind(apartment_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Customer", id));
    }

    get_customer(pool, id).await
}

/// Move a customer into a room; the apartment is re-derived from the room.
pub async fn assign_room(pool: &SqlitePool, id: i64, room_id: i64) -> Result<Customer> {
    let customer = get_customer(pool, id).await?;
    let room = get_room(pool, room_id).await?;

    sqlx::query(
        r#"
        UPDATE customers
        SET room_id = ?, apartment_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(room.id)
    .bind(room.apartment_id)
    .bind(id)
    .execute(pool)
    .await?;

    match customer.room_id {
        Some(previous) if previous != room.id => {
            tracing::info!(customer = id, from = previous, to = room.id, "Customer moved")
        }
        _ => tracing::info!(customer = id, room = room.id, "Customer assigned to room"),
    }

    get_customer(pool, id).await
}

/// Delete a customer by ID.
pub async fn delete_customer(pool: &SqlitePool, id: i64) -> Result<Customer> {
    let customer = get_customer(pool, id).await?;

    sqlx::query("DELETE FROM customers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(customer)
}

/// List customers matching a filter, newest first.
pub async fn list_customers(pool: &SqlitePool, filter: &CustomerFilter) -> Result<Vec<Customer>> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let customers = sqlx::query_as::<_, Customer>(&format!(
        r#"
        SELECT {}
        FROM customers
        WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\' OR phone LIKE ?1 ESCAPE '\')
          AND (?2 IS NULL OR room_id = ?2)
          AND (?3 IS NULL OR apartment_id = ?3)
        ORDER BY created_at DESC, id DESC
        "#,
        CUSTOMER_COLUMNS
    ))
    .bind(pattern)
    .bind(filter.room_id)
    .bind(filter.apartment_id)
    .fetch_all(pool)
    .await?;

    Ok(customers)
}

/// Customers living in an apartment, ordered by ID.
pub async fn list_customers_in_apartment(
    pool: &SqlitePool,
    apartment_id: i64,
) -> Result<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE apartment_id = ? ORDER BY id",
        CUSTOMER_COLUMNS
    ))
    .bind(apartment_id)
    .fetch_all(pool)
    .await?;

    Ok(customers)
}

/// Customers assigned to a room, ordered by ID.
pub async fn list_customers_in_room(pool: &SqlitePool, room_id: i64) -> Result<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {} FROM customers WHERE room_id = ? ORDER BY id",
        CUSTOMER_COLUMNS
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    Ok(customers)
}

/// Count total customers.
pub async fn count_customers(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
