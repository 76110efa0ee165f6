use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use workchat_db::models::UserRow;
use workchat_db::queries::{roles, tokens as token_rows, users};
use workchat_db::stamp::Timestamps;
use workchat_db::{Database, WriteKind, Writer, is_foreign_key_violation, is_unique_violation};

use crate::password::{Credentials, PasswordPolicy};
use crate::{Identity, IdentityError, IdentityResult, NewAccount, Rejection, tokens};

const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// [`Identity`] backed by the WorkChat database.
pub struct DbIdentity {
    db: Arc<Database>,
    credentials: Credentials,
    policy: PasswordPolicy,
    reset_token_ttl: chrono::Duration,
}

impl DbIdentity {
    pub fn new(db: Arc<Database>, policy: PasswordPolicy) -> Self {
        Self {
            db,
            credentials: Credentials::default(),
            policy,
            reset_token_ttl: chrono::Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_reset_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.reset_token_ttl = ttl;
        self
    }

    fn check_password(&self, password: &str) -> IdentityResult<String> {
        let errors = self.policy.check(password);
        if !errors.is_empty() {
            return Err(IdentityError::Rejected(errors));
        }
        Ok(self.credentials.hash(password)?)
    }
}

fn reject(description: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(Rejection(vec![description.into()]))
}

fn load_user(w: &Writer<'_>, user_id: &str) -> anyhow::Result<UserRow> {
    users::query_user_by_id(w.conn(), user_id)?.ok_or_else(|| reject("User not found."))
}

impl Identity for DbIdentity {
    fn find_by_id(&self, id: &str) -> anyhow::Result<Option<UserRow>> {
        self.db.get_user_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRow>> {
        self.db.get_user_by_email(email)
    }

    fn create_account(&self, account: NewAccount, password: &str) -> IdentityResult<UserRow> {
        let mut errors = self.policy.check(password);
        if account.user_name.trim().is_empty() {
            errors.push("User name is required.".to_string());
        } else if self.db.get_user_by_user_name(&account.user_name)?.is_some() {
            errors.push(format!("Username '{}' is already taken.", account.user_name));
        }
        if self.db.get_user_by_email(&account.email)?.is_some() {
            errors.push(format!("Email '{}' is already taken.", account.email));
        }
        if !errors.is_empty() {
            return Err(IdentityError::Rejected(errors));
        }

        let mut user = UserRow {
            id: Uuid::new_v4().to_string(),
            user_name: account.user_name,
            email: account.email,
            email_confirmed: account.email_confirmed,
            password_hash: self.credentials.hash(password)?,
            security_stamp: Uuid::new_v4().to_string(),
            name: account.name,
            last_name: account.last_name,
            timestamps: Timestamps::pending(),
        };

        self.db.write(|w| match w.save(&mut user, WriteKind::Insert) {
            // Lost a race with a concurrent create of the same email or user name.
            Err(e) if is_unique_violation(&e) => Err(reject("Email or user name is already taken.")),
            other => other,
        })?;

        info!("Created account {} ({})", user.email, user.id);
        Ok(user)
    }

    fn verify_credential(&self, email: &str, password: &str) -> anyhow::Result<Option<UserRow>> {
        let Some(user) = self.db.get_user_by_email(email)? else {
            return Ok(None);
        };
        if self.credentials.verify(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    fn roles(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        self.db.get_roles_for_user(user_id)
    }

    fn is_in_role(&self, user_id: &str, role: &str) -> anyhow::Result<bool> {
        self.db.is_user_in_role(user_id, role)
    }

    fn assign_role(&self, user_id: &str, role: &str) -> IdentityResult<()> {
        self.db.write(|w| {
            let mut user = load_user(w, user_id)?;
            let role_row = roles::ensure_role(w.conn(), role)?;
            if !roles::add_user_to_role(w.conn(), user_id, &role_row.id)? {
                return Err(reject(format!("User already in role '{}'.", role_row.name)));
            }
            w.save(&mut user, WriteKind::Update)
        })?;

        info!("Added user {} to role '{}'", user_id, role);
        Ok(())
    }

    fn remove_role(&self, user_id: &str, role: &str) -> IdentityResult<()> {
        self.db.write(|w| {
            let mut user = load_user(w, user_id)?;
            let removed = match roles::query_role_by_name(w.conn(), role)? {
                Some(role_row) => roles::remove_user_from_role(w.conn(), user_id, &role_row.id)?,
                None => false,
            };
            if !removed {
                return Err(reject(format!("User is not in role '{}'.", role)));
            }
            w.save(&mut user, WriteKind::Update)
        })?;

        info!("Removed user {} from role '{}'", user_id, role);
        Ok(())
    }

    fn generate_reset_token(&self, user_id: &str) -> IdentityResult<String> {
        let token = tokens::generate();
        let ttl = self.reset_token_ttl;
        self.db.write(|w| {
            load_user(w, user_id)?;
            token_rows::upsert_token(
                w.conn(),
                user_id,
                tokens::RESET_PASSWORD_PURPOSE,
                &tokens::digest(&token),
                w.now() + ttl,
            )
        })?;
        Ok(token)
    }

    fn consume_reset_token(&self, user_id: &str, token: &str, new_password: &str) -> IdentityResult<()> {
        let password_hash = self.check_password(new_password)?;

        self.db.write(|w| {
            let mut user = load_user(w, user_id)?;
            let stored = token_rows::take_token(w.conn(), user_id, tokens::RESET_PASSWORD_PURPOSE)?;
            let valid = matches!(
                &stored,
                Some((digest, expires_at)) if *digest == tokens::digest(token) && *expires_at > w.now()
            );
            if !valid {
                return Err(reject("Invalid token."));
            }

            user.password_hash = password_hash;
            user.security_stamp = Uuid::new_v4().to_string();
            w.save(&mut user, WriteKind::Update)
        })?;

        info!("Password reset for user {}", user_id);
        Ok(())
    }

    fn delete_account(&self, user_id: &str) -> IdentityResult<()> {
        self.db.write(|w| match users::delete_user(w.conn(), user_id) {
            Ok(true) => Ok(()),
            Ok(false) => Err(reject("User not found.")),
            Err(e) if is_foreign_key_violation(&e) => Err(reject(
                "User has authored chat rooms or messages and cannot be deleted.",
            )),
            Err(e) => Err(e.context(format!("deleting user {}", user_id))),
        })?;

        info!("Deleted account {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn identity() -> (Arc<Database>, DbIdentity) {
        let next = Mutex::new(Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap());
        let db = Arc::new(Database::open_in_memory().unwrap().with_clock(move || -> DateTime<Utc> {
            let mut t = next.lock().unwrap();
            let now = *t;
            *t = now + chrono::Duration::seconds(1);
            now
        }));
        let identity = DbIdentity::new(db.clone(), PasswordPolicy::default())
            .with_credentials(Credentials::with_params(8, 1, 1).unwrap());
        (db, identity)
    }

    fn account(email: &str, user_name: &str) -> NewAccount {
        NewAccount {
            user_name: user_name.into(),
            email: email.into(),
            name: "Test".into(),
            last_name: "User".into(),
            email_confirmed: true,
        }
    }

    #[test]
    fn create_then_verify() {
        let (_db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let found = identity.verify_credential("ANN@example.com", "secret1").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(identity.verify_credential("ann@example.com", "wrong!").unwrap().is_none());
        assert!(identity.verify_credential("nobody@example.com", "secret1").unwrap().is_none());
    }

    #[test]
    fn create_collects_every_rejection() {
        let (db, identity) = identity();
        identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let err = identity.create_account(account("Ann@Example.com", "ANN"), "abc").unwrap_err();
        let IdentityError::Rejected(descriptions) = err else {
            panic!("expected rejection");
        };
        assert_eq!(
            descriptions,
            vec![
                "Passwords must be at least 6 characters.".to_string(),
                "Username 'ANN' is already taken.".to_string(),
                "Email 'Ann@Example.com' is already taken.".to_string(),
            ]
        );
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn assigning_creates_role_lazily_and_refreshes_updated_at() {
        let (db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        identity.assign_role(&user.id, "Admin").unwrap();
        assert!(identity.is_in_role(&user.id, "Admin").unwrap());
        let stored = db.get_user_by_id(&user.id).unwrap().unwrap();
        assert!(stored.timestamps.updated_at > user.timestamps.updated_at);
        assert_eq!(stored.timestamps.created_at, user.timestamps.created_at);

        let err = identity.assign_role(&user.id, "Admin").unwrap_err();
        assert_eq!(err.to_string(), "User already in role 'Admin'.");
    }

    #[test]
    fn removing_missing_membership_is_rejected() {
        let (_db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let err = identity.remove_role(&user.id, "Admin").unwrap_err();
        assert_eq!(err.to_string(), "User is not in role 'Admin'.");

        identity.assign_role(&user.id, "Admin").unwrap();
        identity.remove_role(&user.id, "Admin").unwrap();
        assert!(identity.roles(&user.id).unwrap().is_empty());
    }

    #[test]
    fn reset_token_changes_password_once() {
        let (_db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let token = identity.generate_reset_token(&user.id).unwrap();
        identity.consume_reset_token(&user.id, &token, "newpass1").unwrap();
        assert!(identity.verify_credential("ann@example.com", "newpass1").unwrap().is_some());
        assert!(identity.verify_credential("ann@example.com", "secret1").unwrap().is_none());

        let err = identity.consume_reset_token(&user.id, &token, "another1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid token.");
    }

    #[test]
    fn weak_password_leaves_token_usable() {
        let (_db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let token = identity.generate_reset_token(&user.id).unwrap();
        let err = identity.consume_reset_token(&user.id, &token, "123").unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(_)));

        identity.consume_reset_token(&user.id, &token, "123456").unwrap();
    }

    #[test]
    fn wrong_token_does_not_burn_the_real_one() {
        let (_db, identity) = identity();
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let token = identity.generate_reset_token(&user.id).unwrap();
        assert!(identity.consume_reset_token(&user.id, "forged", "newpass1").is_err());
        identity.consume_reset_token(&user.id, &token, "newpass1").unwrap();
    }

    #[test]
    fn expired_token_is_invalid() {
        let (_db, identity) = identity();
        let identity = identity.with_reset_token_ttl(chrono::Duration::zero());
        let user = identity.create_account(account("ann@example.com", "ann"), "secret1").unwrap();

        let token = identity.generate_reset_token(&user.id).unwrap();
        let err = identity.consume_reset_token(&user.id, &token, "newpass1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid token.");
    }

    #[test]
    fn delete_blocked_by_authored_messages() {
        let (db, identity) = identity();
        let owner = identity.create_account(account("own@example.com", "own"), "secret1").unwrap();
        let sender = identity.create_account(account("snd@example.com", "snd"), "secret1").unwrap();
        let room = db.create_room(Some("general"), true, &owner.id, &[sender.id.as_str()]).unwrap();
        db.insert_message(room.id, &sender.id, "hello").unwrap();

        let err = identity.delete_account(&sender.id).unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(_)));
        assert!(identity.find_by_id(&sender.id).unwrap().is_some());

        let err = identity.delete_account(&owner.id).unwrap_err();
        assert!(matches!(err, IdentityError::Rejected(_)));

        let free = identity.create_account(account("free@example.com", "free"), "secret1").unwrap();
        identity.assign_role(&free.id, "Admin").unwrap();
        identity.delete_account(&free.id).unwrap();
        assert!(identity.find_by_id(&free.id).unwrap().is_none());
    }
}
