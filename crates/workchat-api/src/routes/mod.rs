pub mod account;
pub mod admin;
pub mod announcements;
pub mod chat;
pub mod home;

use axum::{Json, response::IntoResponse, response::Response};
use serde::Serialize;

pub(crate) fn page<T: Serialize>(model: T) -> Response {
    Json(model).into_response()
}
