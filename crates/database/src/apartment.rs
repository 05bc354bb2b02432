//! Apartment CRUD operations.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Apartment;
use crate::validation::{validate_code, ValidationError, MAX_NAME_LENGTH};

const APARTMENT_COLUMNS: &str = "id, code, name, address, description, created_at, updated_at";

/// Fields for creating or replacing an apartment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentInput {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApartmentInput {
    /// An apartment known only by its code.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }
}

/// Create a new apartment.
pub async fn create_apartment(pool: &SqlitePool, input: &ApartmentInput) -> Result<Apartment> {
    let code = validate_code("code", &input.code)?;
    let name_len = input.name.chars().count();
    if name_len > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
            actual: name_len,
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO apartments (code, name, address, description)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(code)
    .bind(&input.name)
    .bind(&input.address)
    .bind(&input.description)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Apartment", code))?;

    tracing::info!(code = %code, "Apartment created");
    get_apartment(pool, result.last_insert_rowid()).await
}

/// Get an apartment by ID.
pub async fn get_apartment(pool: &SqlitePool, id: i64) -> Result<Apartment> {
    sqlx::query_as::<_, Apartment>(&format!(
        "SELECT {} FROM apartments WHERE id = ?",
        APARTMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Apartment", id))
}

/// Get an apartment by its business code.
pub async fn get_apartment_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Apartment>> {
    let apartment = sqlx::query_as::<_, Apartment>(&format!(
        "SELECT {} FROM apartments WHERE code = ?",
        APARTMENT_COLUMNS
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(apartment)
}

/// Return the apartment with `code`, creating it with empty attributes if missing.
pub async fn find_or_create_apartment(pool: &SqlitePool, code: &str) -> Result<Apartment> {
    if let Some(apartment) = get_apartment_by_code(pool, code).await? {
        return Ok(apartment);
    }
    create_apartment(pool, &ApartmentInput::with_code(code)).await
}

/// Replace an apartment's attributes.
pub async fn update_apartment(
    pool: &SqlitePool,
    id: i64,
    input: &ApartmentInput,
) -> Result<Apartment> {
    let code = validate_code("code", &input.code)?;

    let result = sqlx::query(
        r#"
        UPDATE apartments
        SET code = ?, name = ?, address = ?, description = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(code)
    .bind(&input.name)
    .bind(&input.address)
    .bind(&input.description)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Apartment", code))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Apartment", id));
    }

    get_apartment(pool, id).await
}

/// Delete an apartment. Fails while it still owns rooms.
pub async fn delete_apartment(pool: &SqlitePool, id: i64) -> Result<Apartment> {
    let apartment = get_apartment(pool, id).await?;

    let rooms = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms WHERE apartment_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if rooms > 0 {
        return Err(DatabaseError::InUse {
            entity: "Apartment",
            id: apartment.code,
            dependent: "room",
            count: rooms,
        });
    }

    sqlx::query("DELETE FROM apartments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(code = %apartment.code, "Apartment deleted");
    Ok(apartment)
}

/// List all apartments, newest first.
pub async fn list_apartments(pool: &SqlitePool) -> Result<Vec<Apartment>> {
    let apartments = sqlx::query_as::<_, Apartment>(&format!(
        "SELECT {} FROM apartments ORDER BY created_at DESC, id DESC",
        APARTMENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(apartments)
}

/// Count total apartments.
pub async fn count_apartments(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM apartments")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
