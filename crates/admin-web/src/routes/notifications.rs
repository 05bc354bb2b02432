//! Notification endpoints.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use broadcaster::NotificationRequest;
use database::notification;

use crate::error::Result;
use crate::response::{created, ok, Listing};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Response> {
    let pool = state.db.pool();
    let rows = notification::list_notifications(pool).await?;
    let total = notification::count_notifications(pool).await?;
    Ok(ok("Notifications loaded", Listing { rows, total }))
}

/// Resolve recipients, deliver and store the notification with its logs.
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Response> {
    let sent = state.broadcaster.send_notification(&request).await?;
    Ok(created("Notification sent", sent))
}

/// Store a notification without delivering it.
pub async fn draft(
    State(state): State<AppState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Response> {
    let stored = state.broadcaster.record_notification(&request).await?;
    Ok(created("Notification saved", stored))
}
