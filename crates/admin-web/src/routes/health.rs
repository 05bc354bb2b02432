//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use database::{apartment, invoice};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub apartments: i64,
    pub invoices: i64,
}

/// Health check endpoint. Touches the store so a dead pool shows up as a 500.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>> {
    let pool = state.db.pool();
    Ok(Json(Health {
        status: "ok".to_string(),
        apartments: apartment::count_apartments(pool).await?,
        invoices: invoice::count_invoices(pool).await?,
    }))
}
