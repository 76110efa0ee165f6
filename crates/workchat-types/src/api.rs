use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::form::{checkbox, lenient_number};
use crate::paging::PageRequest;

// -- Session --

/// Claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    /// Security stamp at sign-in; a later rotation ends the session.
    pub stamp: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

// -- User list context --

/// Search and paging state threaded through the admin user screens so a
/// redirect lands back on the same slice of the list.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ListContext {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, rename = "pageSize", deserialize_with = "lenient_number")]
    pub page_size: Option<i64>,
}

impl ListContext {
    pub fn paging(&self) -> PageRequest {
        PageRequest::clamp(self.page, self.page_size)
    }

    /// The search filter, trimmed, or `None` when blank.
    pub fn filter(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn users_url(&self) -> String {
        let paging = self.paging();
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = &self.q {
            query.append_pair("q", q);
        }
        query.append_pair("page", &paging.page.to_string());
        query.append_pair("pageSize", &paging.page_size.to_string());
        format!("/admin/users?{}", query.finish())
    }
}

/// Target of a row action on the user list (toggle admin, delete).
#[derive(Debug, Deserialize)]
pub struct UserActionForm {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub list: ListContext,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordQuery {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub list: ListContext,
}

// -- Admin forms --

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_admin: bool,
}

impl CreateUserRequest {
    /// Copy safe to echo back into a re-rendered form.
    pub fn without_secrets(&self) -> Self {
        Self {
            password: String::new(),
            confirm_password: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(flatten)]
    pub list: ListContext,
}

impl ResetPasswordRequest {
    pub fn without_secrets(&self) -> Self {
        Self {
            new_password: String::new(),
            confirm_password: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AnnouncementForm {
    #[serde(default, deserialize_with = "lenient_number")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_pinned: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_published: bool,
}

// -- Validation --

/// A validation message; `field` is `None` for form-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// A form re-rendered after a failed submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormPage<T> {
    pub values: T,
    pub errors: Vec<FieldError>,
}
