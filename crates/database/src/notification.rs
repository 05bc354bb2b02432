//! Notification records and their delivery logs.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{DeliveryLog, Notification};
use crate::validation::{validate_required, MAX_NAME_LENGTH};

/// Maximum allowed length for notification content.
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// A notification ready to be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub content: String,
    pub apartment_ids: Vec<i64>,
    pub room_ids: Vec<i64>,
    pub logs: Vec<DeliveryLog>,
}

/// Persist a notification with its targets and logs in one transaction.
pub async fn create_notification(
    pool: &SqlitePool,
    notification: &NewNotification,
) -> Result<Notification> {
    let title = validate_required("title", &notification.title, MAX_NAME_LENGTH)?;
    let content = validate_required("content", &notification.content, MAX_CONTENT_LENGTH)?;

    let mut tx = pool.begin().await?;

    let id = sqlx::query("INSERT INTO notifications (title, content) VALUES (?, ?)")
        .bind(title)
        .bind(content)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for apartment_id in &notification.apartment_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO notification_apartments (notification_id, apartment_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(apartment_id)
        .execute(&mut *tx)
        .await?;
    }

    for room_id in &notification.room_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO notification_rooms (notification_id, room_id) VALUES (?, ?)",
        )
        .bind(id)
        .bind(room_id)
        .execute(&mut *tx)
        .await?;
    }

    for log in &notification.logs {
        sqlx::query(
            r#"
            INSERT INTO notification_logs (notification_id, customer_name, customer_phone, message, result)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&log.customer_name)
        .bind(&log.customer_phone)
        .bind(&log.message)
        .bind(&log.result)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        notification_id = id,
        deliveries = notification.logs.len(),
        "Notification stored"
    );

    get_notification(pool, id).await
}

async fn load_details(pool: &SqlitePool, notification: &mut Notification) -> Result<()> {
    notification.apartment_ids = sqlx::query_scalar::<_, i64>(
        "SELECT apartment_id FROM notification_apartments WHERE notification_id = ? ORDER BY apartment_id",
    )
    .bind(notification.id)
    .fetch_all(pool)
    .await?;

    notification.room_ids = sqlx::query_scalar::<_, i64>(
        "SELECT room_id FROM notification_rooms WHERE notification_id = ? ORDER BY room_id",
    )
    .bind(notification.id)
    .fetch_all(pool)
    .await?;

    notification.logs = sqlx::query_as::<_, DeliveryLog>(
        r#"
        SELECT customer_name, customer_phone, message, result
        FROM notification_logs
        WHERE notification_id = ?
        ORDER BY id
        "#,
    )
    .bind(notification.id)
    .fetch_all(pool)
    .await?;

    Ok(())
}

/// Get a notification with its targets and logs.
pub async fn get_notification(pool: &SqlitePool, id: i64) -> Result<Notification> {
    let mut notification = sqlx::query_as::<_, Notification>(
        "SELECT id, title, content, created_at FROM notifications WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Notification", id))?;

    load_details(pool, &mut notification).await?;
    Ok(notification)
}

/// List notifications, newest first.
pub async fn list_notifications(pool: &SqlitePool) -> Result<Vec<Notification>> {
    let mut notifications = sqlx::query_as::<_, Notification>(
        "SELECT id, title, content, created_at FROM notifications ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    for notification in &mut notifications {
        load_details(pool, notification).await?;
    }

    Ok(notifications)
}

/// Count total notifications.
pub async fn count_notifications(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
