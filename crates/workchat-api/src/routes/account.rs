use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use workchat_types::api::LoginRequest;
use workchat_types::models::LoginPage;

use crate::error::ServiceError;
use crate::notice;
use crate::routes::page;
use crate::session;
use crate::state::{AppState, blocking};

const INVALID_LOGIN: &str = "Invalid login attempt.";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_url: Option<String>,
}

pub async fn login_page(Query(query): Query<LoginQuery>, jar: CookieJar) -> Response {
    let (jar, notice) = notice::take(jar);
    let model = LoginPage {
        email: String::new(),
        return_url: query.return_url,
        errors: vec![],
        notice,
    };
    (jar, page(model)).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<LoginRequest>,
) -> Result<Response, ServiceError> {
    let email = req.email.trim().to_string();
    let password = req.password;
    let lookup = email.clone();
    let user = blocking(&state, move |s| Ok(s.identity.verify_credential(&lookup, &password)?)).await?;

    let Some(user) = user else {
        warn!("Failed login for {}", email);
        let model = LoginPage {
            email,
            return_url: req.return_url,
            errors: vec![INVALID_LOGIN.to_string()],
            notice: None,
        };
        return Ok((StatusCode::UNAUTHORIZED, page(model)).into_response());
    };

    let token = session::create_token(&state.config.jwt_secret, &user, state.config.session_hours)?;
    info!("User {} signed in", user.id);

    let target = session::safe_return_url(req.return_url.as_deref()).unwrap_or("/home");
    let jar = jar.add(session::session_cookie(token));
    Ok((jar, Redirect::to(target)).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    (session::clear_session(jar), Redirect::to("/")).into_response()
}
