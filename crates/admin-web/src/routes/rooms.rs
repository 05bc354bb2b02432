//! Room endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use database::room;
use serde::Deserialize;

use crate::error::Result;
use crate::response::{created, ok};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub apartment_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewRoom {
    pub code: String,
    pub apartment_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RoomUpdate {
    pub code: String,
    pub apartment_id: Option<i64>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<RoomQuery>) -> Result<Response> {
    let rooms = room::list_rooms(state.db.pool(), query.apartment_id).await?;
    Ok(ok("Rooms loaded", rooms))
}

pub async fn create(State(state): State<AppState>, Json(input): Json<NewRoom>) -> Result<Response> {
    let created_room = room::create_room(state.db.pool(), &input.code, input.apartment_id).await?;
    Ok(created("Room created", created_room))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let found = room::get_room(state.db.pool(), id).await?;
    Ok(ok("Room loaded", found))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RoomUpdate>,
) -> Result<Response> {
    let updated = room::update_room(state.db.pool(), id, &input.code, input.apartment_id).await?;
    Ok(ok("Room updated", updated))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let deleted = room::delete_room(state.db.pool(), id).await?;
    Ok(ok("Room deleted", deleted))
}
