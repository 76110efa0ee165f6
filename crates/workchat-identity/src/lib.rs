//! WorkChat identity subsystem.
//!
//! Account credentials, role membership and password reset tokens live
//! behind the [`Identity`] trait so the admin services can be exercised
//! against any implementation. [`DbIdentity`] is the SQLite-backed one.

pub mod password;
pub mod store;
pub mod tokens;

use workchat_db::models::UserRow;

pub use password::{Credentials, PasswordPolicy};
pub use store::DbIdentity;

/// Failure reported by an identity operation.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The operation was refused; each entry is a user-facing description.
    #[error("{}", .0.join(" | "))]
    Rejected(Vec<String>),
    #[error(transparent)]
    Store(anyhow::Error),
}

impl IdentityError {
    pub fn rejected(description: impl Into<String>) -> Self {
        Self::Rejected(vec![description.into()])
    }
}

/// Carried through a store transaction as an error so the transaction rolls
/// back, then surfaced as [`IdentityError::Rejected`].
#[derive(Debug, thiserror::Error)]
#[error("{}", .0.join(" | "))]
pub(crate) struct Rejection(pub(crate) Vec<String>);

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Rejection>() {
            Ok(Rejection(descriptions)) => Self::Rejected(descriptions),
            Err(err) => Self::Store(err),
        }
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Profile for a new account; the password is passed separately.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_name: String,
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub email_confirmed: bool,
}

pub trait Identity: Send + Sync {
    fn find_by_id(&self, id: &str) -> anyhow::Result<Option<UserRow>>;

    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>>;

    fn create_account(&self, account: NewAccount, password: &str) -> IdentityResult<UserRow>;

    /// The account if `password` matches the stored credential.
    fn verify_credential(&self, email: &str, password: &str) -> anyhow::Result<Option<UserRow>>;

    fn roles(&self, user_id: &str) -> anyhow::Result<Vec<String>>;

    fn is_in_role(&self, user_id: &str, role: &str) -> anyhow::Result<bool>;

    /// Add the user to `role`, creating the role on first use.
    fn assign_role(&self, user_id: &str, role: &str) -> IdentityResult<()>;

    fn remove_role(&self, user_id: &str, role: &str) -> IdentityResult<()>;

    fn generate_reset_token(&self, user_id: &str) -> IdentityResult<String>;

    fn consume_reset_token(&self, user_id: &str, token: &str, new_password: &str) -> IdentityResult<()>;

    fn delete_account(&self, user_id: &str) -> IdentityResult<()>;
}
