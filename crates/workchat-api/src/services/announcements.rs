use tracing::info;

use workchat_db::models::{AnnouncementEdit, AnnouncementRow};
use workchat_types::api::{AnnouncementForm, FieldError};
use workchat_types::models::Announcement;

use crate::error::ServiceError;
use crate::state::AppStateInner;

pub const TITLE_MAX_CHARS: usize = 120;
pub const BODY_MAX_CHARS: usize = 2000;

pub fn to_view(row: AnnouncementRow) -> Announcement {
    Announcement {
        id: row.id,
        title: row.title,
        body: row.body,
        is_pinned: row.is_pinned,
        is_published: row.is_published,
        created_by_user_id: row.created_by_user_id,
        created_at: row.timestamps.created_at,
        updated_at: row.timestamps.updated_at,
    }
}

/// The form an admin edits; the id travels with it and must match the path.
pub fn to_form(row: &AnnouncementRow) -> AnnouncementForm {
    AnnouncementForm {
        id: Some(row.id),
        title: row.title.clone(),
        body: row.body.clone(),
        is_pinned: row.is_pinned,
        is_published: row.is_published,
    }
}

/// A blank create form; new announcements are published unless unticked.
pub fn blank_form() -> AnnouncementForm {
    AnnouncementForm {
        is_published: true,
        ..Default::default()
    }
}

pub fn validate(form: &AnnouncementForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if form.title.trim().is_empty() {
        errors.push(FieldError::field("title", "The Title field is required."));
    } else if form.title.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::field(
            "title",
            format!("The field Title must be a string with a maximum length of {TITLE_MAX_CHARS}."),
        ));
    }
    if form.body.trim().is_empty() {
        errors.push(FieldError::field("body", "The Body field is required."));
    } else if form.body.chars().count() > BODY_MAX_CHARS {
        errors.push(FieldError::field(
            "body",
            format!("The field Body must be a string with a maximum length of {BODY_MAX_CHARS}."),
        ));
    }
    errors
}

fn edit_of(form: &AnnouncementForm) -> AnnouncementEdit {
    AnnouncementEdit {
        title: form.title.clone(),
        body: form.body.clone(),
        is_pinned: form.is_pinned,
        is_published: form.is_published,
    }
}

/// Every announcement, pinned first and newest first within each group.
pub fn list(state: &AppStateInner) -> Result<Vec<Announcement>, ServiceError> {
    Ok(state.db.list_announcements()?.into_iter().map(to_view).collect())
}

pub fn get(state: &AppStateInner, id: i64) -> Result<AnnouncementRow, ServiceError> {
    state.db.get_announcement(id)?.ok_or(ServiceError::NotFound)
}

pub fn create(state: &AppStateInner, acting_id: &str, form: &AnnouncementForm) -> Result<Announcement, ServiceError> {
    let errors = validate(form);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let row = state.db.insert_announcement(edit_of(form), Some(acting_id))?;
    info!("Admin {} created announcement {}", acting_id, row.id);
    Ok(to_view(row))
}

/// Copy title, body and the two flags onto announcement `id`. The form must
/// carry the same id as the path.
pub fn edit(state: &AppStateInner, acting_id: &str, id: i64, form: &AnnouncementForm) -> Result<Announcement, ServiceError> {
    if form.id != Some(id) {
        return Err(ServiceError::BadRequest("Announcement id does not match the request path."));
    }
    let errors = validate(form);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let row = state
        .db
        .update_announcement(id, edit_of(form))?
        .ok_or(ServiceError::NotFound)?;
    info!("Admin {} updated announcement {}", acting_id, id);
    Ok(to_view(row))
}

pub fn delete(state: &AppStateInner, acting_id: &str, id: i64) -> Result<(), ServiceError> {
    if !state.db.delete_announcement(id)? {
        return Err(ServiceError::NotFound);
    }
    info!("Admin {} deleted announcement {}", acting_id, id);
    Ok(())
}
