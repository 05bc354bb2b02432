//! JSend success bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// A `{status: "success", message, data}` body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    message: String,
    data: T,
}

/// 200 with `data`.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::OK, message, data)
}

/// 201 with the created resource.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    respond(StatusCode::CREATED, message, data)
}

fn respond<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    let body = Envelope {
        status: "success",
        message: message.into(),
        data,
    };
    (status, Json(body)).into_response()
}

/// A list together with its total.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub total: i64,
}
