//! Route handlers for the admin API.

pub mod apartments;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod notifications;
pub mod rooms;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Entity store
        .route("/api/apartments", get(apartments::list).post(apartments::create))
        .route(
            "/api/apartments/:id",
            get(apartments::show)
                .put(apartments::update)
                .delete(apartments::delete),
        )
        .route("/api/rooms", get(rooms::list).post(rooms::create))
        .route(
            "/api/rooms/:id",
            get(rooms::show).put(rooms::update).delete(rooms::delete),
        )
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/:id",
            get(customers::show)
                .put(customers::update)
                .delete(customers::delete),
        )
        .route("/api/customers/:id/assign-room", post(customers::assign_room))
        // Invoices
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/report", get(invoices::report))
        .route("/api/invoices/send", post(invoices::send_bulk))
        .route("/api/invoices/sync", post(invoices::sync))
        .route("/api/invoices/:id", get(invoices::show))
        .route("/api/invoices/:id/send", post(invoices::send_one))
        // Notifications
        .route(
            "/api/notifications",
            get(notifications::list).post(notifications::send),
        )
        .route("/api/notifications/draft", post(notifications::draft))
}
