//! Room CRUD operations.

use sqlx::SqlitePool;

use crate::apartment::get_apartment;
use crate::error::{DatabaseError, Result};
use crate::models::Room;
use crate::validation::validate_code;

const ROOM_COLUMNS: &str = "id, code, apartment_id, created_at, updated_at";

/// Create a room inside an existing apartment.
pub async fn create_room(pool: &SqlitePool, code: &str, apartment_id: i64) -> Result<Room> {
    let code = validate_code("code", code)?;
    let apartment = get_apartment(pool, apartment_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO rooms (code, apartment_id)
        VALUES (?, ?)
        "#,
    )
    .bind(code)
    .bind(apartment_id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Room", format!("{}/{}", apartment.code, code)))?;

    tracing::info!(apartment = %apartment.code, code = %code, "Room created");
    get_room(pool, result.last_insert_rowid()).await
}

/// Get a room by ID.
pub async fn get_room(pool: &SqlitePool, id: i64) -> Result<Room> {
    sqlx::query_as::<_, Room>(&format!("SELECT {} FROM rooms WHERE id = ?", ROOM_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Room", id))
}

/// Find a room by its `(code, apartment_id)` pair.
pub async fn find_room(pool: &SqlitePool, code: &str, apartment_id: i64) -> Result<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(&format!(
        "SELECT {} FROM rooms WHERE code = ? AND apartment_id = ?",
        ROOM_COLUMNS
    ))
    .bind(code)
    .bind(apartment_id)
    .fetch_optional(pool)
    .await?;

    Ok(room)
}

/// Return the room with `code` in the apartment, creating it if missing.
pub async fn find_or_create_room(pool: &SqlitePool, code: &str, apartment_id: i64) -> Result<Room> {
    if let Some(room) = find_room(pool, code, apartment_id).await? {
        return Ok(room);
    }
    create_room(pool, code, apartment_id).await
}

/// Rename a room and optionally move it to another apartment.
///
/// Tenants of a moved room follow it into the new apartment.
pub async fn update_room(
    pool: &SqlitePool,
    id: i64,
    code: &str,
    apartment_id: Option<i64>,
) -> Result<Room> {
    let code = validate_code("code", code)?;
    let room = get_room(pool, id).await?;

    if let Some(apartment_id) = apartment_id {
        get_apartment(pool, apartment_id).await?;
    }
    let target_apartment = apartment_id.unwrap_or(room.apartment_id);

    let clash = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM rooms WHERE code = ? AND apartment_id = ? AND id != ?",
    )
    .bind(code)
    .bind(target_apartment)
    .bind(id)
    .fetch_one(pool)
    .await?;
    if clash > 0 {
        return Err(DatabaseError::AlreadyExists {
            entity: "Room",
            id: code.to_string(),
        });
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE rooms
        SET code = ?, apartment_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(code)
    .bind(target_apartment)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if target_apartment != room.apartment_id {
        let moved = sqlx::query(
            r#"
            UPDATE customers
            SET apartment_id = ?, updated_at = datetime('now')
            WHERE room_id = ?
            "#,
        )
        .bind(target_apartment)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tracing::info!(
            room = id,
            from = room.apartment_id,
            to = target_apartment,
            tenants = moved,
            "Room moved to another apartment"
        );
    }

    tx.commit().await?;

    get_room(pool, id).await
}

/// Delete a room. Fails while customers are still assigned to it.
pub async fn delete_room(pool: &SqlitePool, id: i64) -> Result<Room> {
    let room = get_room(pool, id).await?;

    let customers = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE room_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if customers > 0 {
        return Err(DatabaseError::InUse {
            entity: "Room",
            id: room.code,
            dependent: "customer",
            count: customers,
        });
    }

    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(code = %room.code, "Room deleted");
    Ok(room)
}

/// List rooms, optionally restricted to one apartment.
pub async fn list_rooms(pool: &SqlitePool, apartment_id: Option<i64>) -> Result<Vec<Room>> {
    let rooms = match apartment_id {
        Some(apartment_id) => {
            sqlx::query_as::<_, Room>(&format!(
                "SELECT {} FROM rooms WHERE apartment_id = ? ORDER BY code",
                ROOM_COLUMNS
            ))
            .bind(apartment_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Room>(&format!(
                "SELECT {} FROM rooms ORDER BY created_at DESC, id DESC",
                ROOM_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rooms)
}

/// Count total rooms.
pub async fn count_rooms(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
