use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};

use crate::error::ServiceError;
use crate::middleware::CurrentUser;
use crate::routes::page;
use crate::services::chat;
use crate::state::{AppState, blocking};

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ServiceError> {
    let model = blocking(&state, move |s| chat::list_rooms(s, &user.id)).await?;
    Ok(page(model))
}

pub async fn room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, ServiceError> {
    let model = blocking(&state, move |s| chat::open_room(s, &user.id, room_id)).await?;
    Ok(page(model))
}
