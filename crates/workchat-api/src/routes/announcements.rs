use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, cookie::CookieJar};

use workchat_types::api::{AnnouncementForm, FormPage};
use workchat_types::models::Notice;

use crate::error::ServiceError;
use crate::middleware::CurrentUser;
use crate::notice;
use crate::routes::page;
use crate::services::announcements;
use crate::state::{AppState, blocking};

const LIST_URL: &str = "/admin/announcements";

fn invalid(form: AnnouncementForm, err: &ServiceError) -> Response {
    let model = FormPage {
        values: form,
        errors: err.form_errors(),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, page(model)).into_response()
}

pub async fn create_form() -> Response {
    page(FormPage {
        values: announcements::blank_form(),
        errors: vec![],
    })
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<AnnouncementForm>,
) -> Result<Response, ServiceError> {
    let submitted = form.clone();
    match blocking(&state, move |s| announcements::create(s, &user.id, &form)).await {
        Ok(_) => Ok(notice::redirect(jar, LIST_URL, Notice::success("Announcement created.")).into_response()),
        Err(e @ ServiceError::Validation(_)) => Ok(invalid(submitted, &e)),
        Err(e) => Err(e),
    }
}

pub async fn edit_form(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, ServiceError> {
    let row = blocking(&state, move |s| announcements::get(s, id)).await?;
    Ok(page(FormPage {
        values: announcements::to_form(&row),
        errors: vec![],
    }))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<AnnouncementForm>,
) -> Result<Response, ServiceError> {
    let submitted = form.clone();
    match blocking(&state, move |s| announcements::edit(s, &user.id, id, &form)).await {
        Ok(_) => Ok(notice::redirect(jar, LIST_URL, Notice::success("Announcement updated.")).into_response()),
        Err(e @ ServiceError::Validation(_)) => Ok(invalid(submitted, &e)),
        Err(e) => Err(e),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, ServiceError> {
    blocking(&state, move |s| announcements::delete(s, &user.id, id)).await?;
    Ok(notice::redirect(jar, LIST_URL, Notice::success("Announcement deleted.")).into_response())
}
