use anyhow::Result;
use tracing::info;

use workchat_identity::{Identity, NewAccount};
use workchat_types::ADMIN_ROLE;

use crate::config::Config;

/// Make sure the configured admin account exists and holds the admin role.
/// Safe to run on every start.
pub fn seed_admin(identity: &dyn Identity, config: &Config) -> Result<()> {
    let user = match identity.find_by_email(&config.admin_email)? {
        Some(user) => user,
        None => {
            let account = NewAccount {
                user_name: config.admin_email.clone(),
                email: config.admin_email.clone(),
                name: "Admin".into(),
                last_name: "User".into(),
                email_confirmed: true,
            };
            let user = identity.create_account(account, &config.admin_password)?;
            info!("Seeded admin account {}", user.email);
            user
        }
    };

    if !identity.is_in_role(&user.id, ADMIN_ROLE)? {
        identity.assign_role(&user.id, ADMIN_ROLE)?;
        info!("Granted {} to {}", ADMIN_ROLE, user.email);
    }
    Ok(())
}
