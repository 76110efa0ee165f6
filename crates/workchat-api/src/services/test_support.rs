use std::sync::Arc;

use workchat_db::Database;
use workchat_identity::{Credentials, DbIdentity, Identity, NewAccount, PasswordPolicy};
use workchat_types::ADMIN_ROLE;

use crate::config::Config;
use crate::state::{AppState, AppStateInner};

pub fn state() -> AppState {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let identity = DbIdentity::new(db.clone(), PasswordPolicy::default())
        .with_credentials(Credentials::with_params(8, 1, 1).unwrap());
    AppStateInner::new(db, Arc::new(identity), Config::default())
}

pub fn add_user(state: &AppState, email: &str, admin: bool) -> String {
    let user_name = email.split('@').next().unwrap_or(email).to_string();
    let user = state
        .identity
        .create_account(
            NewAccount {
                user_name,
                email: email.into(),
                name: "Test".into(),
                last_name: "User".into(),
                email_confirmed: true,
            },
            "secret1",
        )
        .unwrap();
    if admin {
        state.identity.assign_role(&user.id, ADMIN_ROLE).unwrap();
    }
    user.id
}
