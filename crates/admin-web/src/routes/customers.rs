//! Customer endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use database::customer::{self, CustomerFilter, CustomerUpdate, NewCustomer};
use serde::Deserialize;

use crate::error::Result;
use crate::response::{created, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRoom {
    pub room_id: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> Result<Response> {
    let customers = customer::list_customers(state.db.pool(), &filter).await?;
    Ok(ok("Customers loaded", customers))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewCustomer>,
) -> Result<Response> {
    let created_customer = customer::create_customer(state.db.pool(), &input).await?;
    Ok(created("Customer created", created_customer))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let found = customer::get_customer(state.db.pool(), id).await?;
    Ok(ok("Customer loaded", found))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CustomerUpdate>,
) -> Result<Response> {
    let updated = customer::update_customer(state.db.pool(), id, &input).await?;
    Ok(ok("Customer updated", updated))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let deleted = customer::delete_customer(state.db.pool(), id).await?;
    Ok(ok("Customer deleted", deleted))
}

pub async fn assign_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AssignRoom>,
) -> Result<Response> {
    let moved = customer::assign_room(state.db.pool(), id, input.room_id).await?;
    Ok(ok("Customer assigned to room", moved))
}
