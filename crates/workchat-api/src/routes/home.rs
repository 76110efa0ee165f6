use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::ServiceError;
use crate::middleware::resolve_user;
use crate::notice;
use crate::routes::page;
use crate::services::home;
use crate::state::{AppState, blocking};

/// `/` sends signed-in users to the feed and everyone else to the login page.
pub async fn root(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let target = match resolve_user(&state, &jar, &headers).await? {
        Some(_) => "/home",
        None => "/account/login",
    };
    Ok(Redirect::to(target).into_response())
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ServiceError> {
    let mut model = blocking(&state, home::home_page).await?;
    let (jar, notice) = notice::take(jar);
    model.notice = notice;
    Ok((jar, page(model)).into_response())
}
