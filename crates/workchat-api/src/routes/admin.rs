use axum::{
    Extension, Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Repeated keys (checkbox plus hidden fallback) need the multi-value form extractor.
use axum_extra::extract::{Form as ExtraForm, cookie::CookieJar};

use workchat_types::api::{
    CreateUserRequest, FormPage, ListContext, ResetPasswordQuery, ResetPasswordRequest, UserActionForm,
};
use workchat_types::models::{AnnouncementsPage, Notice};

use crate::error::ServiceError;
use crate::middleware::CurrentUser;
use crate::notice;
use crate::routes::page;
use crate::services::{announcements, users};
use crate::state::{AppState, blocking};

const USERS_URL: &str = "/admin/users";

fn form_failure<T: serde::Serialize>(values: T, err: &ServiceError) -> Response {
    let model = FormPage {
        values,
        errors: err.form_errors(),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, page(model)).into_response()
}

/// Row actions redirect back to the list they came from; refusals become an
/// error notice there.
fn back_to_list(jar: CookieJar, list: &ListContext, outcome: Result<Notice, ServiceError>) -> Response {
    match outcome {
        Ok(notice) => notice::redirect(jar, &list.users_url(), notice).into_response(),
        Err(e) if e.is_user_facing() => {
            notice::redirect(jar, &list.users_url(), Notice::error(e.to_string())).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn overview(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ServiceError> {
    let mut model = blocking(&state, users::overview).await?;
    let (jar, notice) = notice::take(jar);
    model.notice = notice;
    Ok((jar, page(model)).into_response())
}

pub async fn list_users(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(ctx): Query<ListContext>,
) -> Result<Response, ServiceError> {
    let mut model = blocking(&state, move |s| users::list_users(s, &ctx)).await?;
    let (jar, notice) = notice::take(jar);
    model.notice = notice;
    Ok((jar, page(model)).into_response())
}

pub async fn create_user_form() -> Response {
    page(FormPage {
        values: CreateUserRequest::default(),
        errors: vec![],
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    ExtraForm(req): ExtraForm<CreateUserRequest>,
) -> Result<Response, ServiceError> {
    let echo = req.without_secrets();
    let outcome = blocking(&state, move |s| users::create_user(s, &user.id, &req)).await;
    match outcome {
        Ok(notice) => Ok(notice::redirect(jar, USERS_URL, notice).into_response()),
        Err(e) if e.is_user_facing() => Ok(form_failure(echo, &e)),
        Err(e) => Err(e),
    }
}

pub async fn toggle_admin(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<UserActionForm>,
) -> Response {
    let target = form.id.clone();
    let outcome = blocking(&state, move |s| users::toggle_admin(s, &user.id, &target)).await;
    back_to_list(jar, &form.list, outcome)
}

pub async fn reset_password_form(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordQuery>,
) -> Result<Response, ServiceError> {
    let model = blocking(&state, move |s| users::reset_password_page(s, &query)).await?;
    Ok(page(model))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(req): Form<ResetPasswordRequest>,
) -> Result<Response, ServiceError> {
    let echo = req.without_secrets();
    let back = req.list.users_url();
    let outcome = blocking(&state, move |s| users::reset_password(s, &user.id, &req)).await;
    match outcome {
        Ok(notice) => Ok(notice::redirect(jar, &back, notice).into_response()),
        Err(e) if e.is_user_facing() => Ok(form_failure(echo, &e)),
        Err(e) => Err(e),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<UserActionForm>,
) -> Response {
    let target = form.id.clone();
    let outcome = blocking(&state, move |s| users::delete_user(s, &user.id, &target)).await;
    back_to_list(jar, &form.list, outcome)
}

pub async fn announcements(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ServiceError> {
    let list = blocking(&state, announcements::list).await?;
    let (jar, notice) = notice::take(jar);
    let model = AnnouncementsPage {
        announcements: list,
        notice,
    };
    Ok((jar, page(model)).into_response())
}
