use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use workchat_identity::IdentityError;
use workchat_types::api::FieldError;

/// Failure of an admin, chat or account operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("A user with this email already exists.")]
    DuplicateEmail,
    /// The acting admin targeted their own account.
    #[error("{0}")]
    SelfModification(&'static str),
    #[error("You can't delete the seeded admin account.")]
    ProtectedAccount,
    #[error("Not found")]
    NotFound,
    /// Descriptions reported by the identity subsystem.
    #[error("{}", .0.join(" | "))]
    SubsystemFailure(Vec<String>),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Forbidden")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    /// Messages to show on a re-rendered form. Every error that is not a
    /// field-level validation message becomes one form-level entry.
    pub fn form_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::SubsystemFailure(descriptions) => {
                descriptions.iter().map(FieldError::form).collect()
            }
            other => vec![FieldError::form(other.to_string())],
        }
    }

    /// Errors a form or list screen reports back to the admin instead of
    /// failing the request.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateEmail
                | Self::SelfModification(_)
                | Self::ProtectedAccount
                | Self::SubsystemFailure(_)
        )
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(descriptions) => Self::SubsystemFailure(descriptions),
            IdentityError::Store(err) => Self::Store(err),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            Self::Store(err) => {
                error!("Store failure: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            user_facing => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": user_facing.form_errors() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_failure_joins_for_notices_and_splits_for_forms() {
        let err = ServiceError::from(IdentityError::Rejected(vec![
            "Passwords must be at least 6 characters.".into(),
            "Username 'ann' is already taken.".into(),
        ]));
        assert_eq!(
            err.to_string(),
            "Passwords must be at least 6 characters. | Username 'ann' is already taken."
        );
        assert_eq!(err.form_errors().len(), 2);
        assert!(err.form_errors().iter().all(|e| e.field.is_none()));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ServiceError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServiceError::BadRequest("mismatch").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::ProtectedAccount.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Store(anyhow::anyhow!("disk on fire")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
