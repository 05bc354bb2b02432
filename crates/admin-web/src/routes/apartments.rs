//! Apartment endpoints.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use database::apartment::{self, ApartmentInput};

use crate::error::Result;
use crate::response::{created, ok};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Response> {
    let apartments = apartment::list_apartments(state.db.pool()).await?;
    Ok(ok("Apartments loaded", apartments))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ApartmentInput>,
) -> Result<Response> {
    let created_apartment = apartment::create_apartment(state.db.pool(), &input).await?;
    Ok(created("Apartment created", created_apartment))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let found = apartment::get_apartment(state.db.pool(), id).await?;
    Ok(ok("Apartment loaded", found))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ApartmentInput>,
) -> Result<Response> {
    let updated = apartment::update_apartment(state.db.pool(), id, &input).await?;
    Ok(ok("Apartment updated", updated))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let deleted = apartment::delete_apartment(state.db.pool(), id).await?;
    Ok(ok("Apartment deleted", deleted))
}
