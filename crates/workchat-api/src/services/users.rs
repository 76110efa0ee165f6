//! Admin user management: search, create, role toggle, password reset and
//! deletion, with the self-protection rules.

use tracing::info;

use workchat_db::models::UserRow;
use workchat_identity::{IdentityError, NewAccount};
use workchat_types::ADMIN_ROLE;
use workchat_types::api::{CreateUserRequest, FieldError, ListContext, ResetPasswordQuery, ResetPasswordRequest};
use workchat_types::models::{AdminOverview, Notice, ResetPasswordPage, UserSummary, UsersPage};

use crate::error::ServiceError;
use crate::state::AppStateInner;

fn summarize(user: UserRow, roles: Vec<String>) -> UserSummary {
    UserSummary {
        is_admin: UserSummary::has_admin_role(&roles),
        id: user.id,
        email: user.email,
        user_name: user.user_name,
        name: user.name,
        last_name: user.last_name,
        created_at: user.timestamps.created_at,
        updated_at: user.timestamps.updated_at,
        roles,
    }
}

fn find_target(state: &AppStateInner, id: &str) -> Result<UserRow, ServiceError> {
    state.identity.find_by_id(id)?.ok_or(ServiceError::NotFound)
}

pub fn overview(state: &AppStateInner) -> Result<AdminOverview, ServiceError> {
    Ok(AdminOverview {
        user_count: state.db.count_users()?,
        admin_count: state.db.count_users_in_role(ADMIN_ROLE)?,
        announcement_count: state.db.count_announcements()?,
        notice: None,
    })
}

/// One page of users matching the filter, ordered by email, with each
/// user's roles resolved in a single batch.
pub fn list_users(state: &AppStateInner, ctx: &ListContext) -> Result<UsersPage, ServiceError> {
    let paging = ctx.paging();
    let (rows, total_count) = state
        .db
        .search_users(ctx.filter(), paging.offset(), paging.limit())?;

    let ids: Vec<String> = rows.iter().map(|u| u.id.clone()).collect();
    let mut roles = state.db.get_roles_for_users(&ids)?;

    let users = rows
        .into_iter()
        .map(|u| {
            let user_roles = roles.remove(&u.id).unwrap_or_default();
            summarize(u, user_roles)
        })
        .collect();

    Ok(UsersPage::new(users, ctx.q.clone(), paging, total_count))
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn required(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::field(field, format!("The {label} field is required.")));
        false
    } else {
        true
    }
}

pub fn validate_create(req: &CreateUserRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if required(&mut errors, "email", "Email", &req.email) && !looks_like_email(req.email.trim()) {
        errors.push(FieldError::field(
            "email",
            "The Email field is not a valid e-mail address.",
        ));
    }
    required(&mut errors, "user_name", "UserName", &req.user_name);
    required(&mut errors, "name", "Name", &req.name);
    required(&mut errors, "last_name", "Last Name", &req.last_name);
    let has_password = required(&mut errors, "password", "Password", &req.password);
    let has_confirm = required(&mut errors, "confirm_password", "Confirm Password", &req.confirm_password);
    if has_password && has_confirm && req.password != req.confirm_password {
        errors.push(FieldError::field(
            "confirm_password",
            "The password and confirmation password do not match.",
        ));
    }
    errors
}

/// Create an account, optionally granting the admin role. A failed role
/// grant does not undo the account; it is reported in the returned notice.
pub fn create_user(state: &AppStateInner, acting_id: &str, req: &CreateUserRequest) -> Result<Notice, ServiceError> {
    let errors = validate_create(req);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let email = req.email.trim();
    if state.identity.find_by_email(email)?.is_some() {
        return Err(ServiceError::DuplicateEmail);
    }

    let account = NewAccount {
        user_name: req.user_name.trim().to_string(),
        email: email.to_string(),
        name: req.name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email_confirmed: true,
    };
    let user = state.identity.create_account(account, &req.password)?;
    info!("Admin {} created user {} ({})", acting_id, user.email, user.id);

    if req.is_admin {
        if let Err(e) = state.identity.assign_role(&user.id, ADMIN_ROLE) {
            return match e {
                IdentityError::Rejected(descriptions) => Ok(Notice::error(descriptions.join(" | "))),
                IdentityError::Store(e) => Err(ServiceError::Store(e)),
            };
        }
    }

    Ok(Notice::success(format!("Created user {}.", user.email)))
}

/// Grant or revoke the admin role on someone else's account.
pub fn toggle_admin(state: &AppStateInner, acting_id: &str, target_id: &str) -> Result<Notice, ServiceError> {
    let user = find_target(state, target_id)?;
    if user.id == acting_id {
        return Err(ServiceError::SelfModification("You can't change your own admin role."));
    }

    if state.identity.is_in_role(&user.id, ADMIN_ROLE)? {
        state.identity.remove_role(&user.id, ADMIN_ROLE)?;
        info!("Admin {} revoked admin from {}", acting_id, user.id);
        Ok(Notice::success(format!("{} is no longer an admin.", user.email)))
    } else {
        state.identity.assign_role(&user.id, ADMIN_ROLE)?;
        info!("Admin {} granted admin to {}", acting_id, user.id);
        Ok(Notice::success(format!("{} is now an admin.", user.email)))
    }
}

pub fn reset_password_page(state: &AppStateInner, query: &ResetPasswordQuery) -> Result<ResetPasswordPage, ServiceError> {
    let user = find_target(state, &query.id)?;
    let paging = query.list.paging();
    Ok(ResetPasswordPage {
        user_id: user.id,
        email: user.email,
        q: query.list.q.clone(),
        page: paging.page,
        page_size: paging.page_size,
    })
}

pub fn validate_reset(req: &ResetPasswordRequest, min_length: usize) -> Vec<FieldError> {
    let mut errors = Vec::new();
    required(&mut errors, "user_id", "UserId", &req.user_id);
    if required(&mut errors, "new_password", "NewPassword", &req.new_password)
        && req.new_password.chars().count() < min_length
    {
        errors.push(FieldError::field(
            "new_password",
            format!("The field NewPassword must be at least {min_length} characters long."),
        ));
    }
    if required(&mut errors, "confirm_password", "ConfirmPassword", &req.confirm_password)
        && req.new_password != req.confirm_password
    {
        errors.push(FieldError::field("confirm_password", "Passwords do not match."));
    }
    errors
}

/// Set a new password by issuing a reset token and consuming it at once.
pub fn reset_password(state: &AppStateInner, acting_id: &str, req: &ResetPasswordRequest) -> Result<Notice, ServiceError> {
    let errors = validate_reset(req, state.config.password_min_length);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let user = find_target(state, &req.user_id)?;
    if user.id == acting_id {
        return Err(ServiceError::SelfModification("You can't reset your own password here."));
    }

    let token = state.identity.generate_reset_token(&user.id)?;
    state
        .identity
        .consume_reset_token(&user.id, &token, &req.new_password)?;

    info!("Admin {} reset the password of {}", acting_id, user.id);
    Ok(Notice::success(format!("Password reset for {}.", user.email)))
}

pub fn delete_user(state: &AppStateInner, acting_id: &str, target_id: &str) -> Result<Notice, ServiceError> {
    let user = find_target(state, target_id)?;
    if user.id == acting_id {
        return Err(ServiceError::SelfModification("You can't delete your own account."));
    }
    if user.email.eq_ignore_ascii_case(&state.config.admin_email) {
        return Err(ServiceError::ProtectedAccount);
    }

    state.identity.delete_account(&user.id)?;
    info!("Admin {} deleted user {} ({})", acting_id, user.email, user.id);
    Ok(Notice::success(format!("Deleted user {}.", user.email)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{add_user, state};

    fn create_request(email: &str, is_admin: bool) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            user_name: email.into(),
            name: "New".into(),
            last_name: "Person".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            is_admin,
        }
    }

    fn ctx(q: Option<&str>, page: i64, page_size: i64) -> ListContext {
        ListContext {
            q: q.map(str::to_string),
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    #[test]
    fn search_matches_three_of_twelve() {
        let state = state();
        for email in ["zed.ann@example.com", "ANNa@example.com", "bob@example.com"] {
            add_user(&state, email, false);
        }
        // Third match through the last name only.
        state
            .identity
            .create_account(
                NewAccount {
                    user_name: "carol".into(),
                    email: "carol@example.com".into(),
                    name: "Carol".into(),
                    last_name: "Hannover".into(),
                    email_confirmed: true,
                },
                "secret1",
            )
            .unwrap();
        for i in 0..8 {
            add_user(&state, &format!("user{i}@example.com"), false);
        }
        assert_eq!(state.db.count_users().unwrap(), 12);

        let page = list_users(&state, &ctx(Some("ann"), 1, 10)).unwrap();
        let emails: Vec<_> = page.users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["ANNa@example.com", "carol@example.com", "zed.ann@example.com"]);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
    }

    #[test]
    fn out_of_range_paging_falls_back() {
        let state = state();
        for i in 0..12 {
            add_user(&state, &format!("user{i:02}@example.com"), false);
        }

        let page = list_users(&state, &ctx(None, -3, 3)).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.users.len(), 10);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next);

        let page = list_users(&state, &ctx(None, 2, 10)).unwrap();
        assert_eq!(page.users.len(), 2);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn created_admin_is_listed_with_role() {
        let state = state();
        let admin = add_user(&state, "boss@example.com", true);

        let notice = create_user(&state, &admin, &create_request("new@example.com", true)).unwrap();
        assert_eq!(notice, Notice::success("Created user new@example.com."));

        let page = list_users(&state, &ctx(Some("new@"), 1, 10)).unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].roles, vec!["Admin".to_string()]);
        assert!(page.users[0].is_admin);
    }

    #[test]
    fn create_validates_fields() {
        let state = state();
        let mut req = create_request("not-an-email", false);
        req.confirm_password = "different".into();
        req.name = "  ".into();

        let Err(ServiceError::Validation(errors)) = create_user(&state, "admin", &req) else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec!["email", "name", "confirm_password"]);
        assert_eq!(state.db.count_users().unwrap(), 0);
    }

    #[test]
    fn create_rejects_duplicate_email_case_insensitively() {
        let state = state();
        add_user(&state, "ann@example.com", false);

        let err = create_user(&state, "admin", &create_request("ANN@example.com", false)).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }

    #[test]
    fn weak_password_surfaces_as_form_error() {
        let state = state();
        let mut req = create_request("new@example.com", false);
        req.password = "abc".into();
        req.confirm_password = "abc".into();

        let err = create_user(&state, "admin", &req).unwrap_err();
        assert_eq!(
            err.form_errors(),
            vec![FieldError::form("Passwords must be at least 6 characters.")]
        );
    }

    #[test]
    fn toggle_flips_membership() {
        let state = state();
        let admin = add_user(&state, "boss@example.com", true);
        let target = add_user(&state, "ann@example.com", false);

        toggle_admin(&state, &admin, &target).unwrap();
        assert!(state.identity.is_in_role(&target, ADMIN_ROLE).unwrap());
        toggle_admin(&state, &admin, &target).unwrap();
        assert!(!state.identity.is_in_role(&target, ADMIN_ROLE).unwrap());

        assert!(matches!(toggle_admin(&state, &admin, "missing"), Err(ServiceError::NotFound)));
    }

    #[test]
    fn self_modification_is_refused_without_mutation() {
        let state = state();
        let admin = add_user(&state, "boss@example.com", true);
        let before = state.identity.find_by_id(&admin).unwrap().unwrap();

        assert!(matches!(
            toggle_admin(&state, &admin, &admin),
            Err(ServiceError::SelfModification(_))
        ));
        assert!(matches!(
            delete_user(&state, &admin, &admin),
            Err(ServiceError::SelfModification(_))
        ));
        let req = ResetPasswordRequest {
            user_id: admin.clone(),
            new_password: "changed1".into(),
            confirm_password: "changed1".into(),
            ..Default::default()
        };
        assert!(matches!(
            reset_password(&state, &admin, &req),
            Err(ServiceError::SelfModification(_))
        ));

        let after = state.identity.find_by_id(&admin).unwrap().unwrap();
        assert!(state.identity.is_in_role(&admin, ADMIN_ROLE).unwrap());
        assert_eq!(after.password_hash, before.password_hash);
        assert_eq!(after.timestamps, before.timestamps);
    }

    #[test]
    fn seeded_admin_is_protected_from_other_admins() {
        let state = state();
        let seeded = add_user(&state, "Admin@Local", true);
        let other = add_user(&state, "boss@example.com", true);

        let err = delete_user(&state, &other, &seeded).unwrap_err();
        assert!(matches!(err, ServiceError::ProtectedAccount));
        assert!(state.identity.find_by_id(&seeded).unwrap().is_some());
    }

    #[test]
    fn delete_blocked_by_authored_rooms_reports_failure() {
        let state = state();
        let admin = add_user(&state, "boss@example.com", true);
        let author = add_user(&state, "ann@example.com", false);
        state.db.create_room(Some("team"), true, &author, &[]).unwrap();

        let err = delete_user(&state, &admin, &author).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User has authored chat rooms or messages and cannot be deleted."
        );

        let free = add_user(&state, "free@example.com", false);
        let notice = delete_user(&state, &admin, &free).unwrap();
        assert_eq!(notice, Notice::success("Deleted user free@example.com."));
    }

    #[test]
    fn reset_sets_new_password() {
        let state = state();
        let admin = add_user(&state, "boss@example.com", true);
        let target = add_user(&state, "ann@example.com", false);

        let req = ResetPasswordRequest {
            user_id: target.clone(),
            new_password: "changed1".into(),
            confirm_password: "changed1".into(),
            ..Default::default()
        };
        reset_password(&state, &admin, &req).unwrap();
        assert!(
            state
                .identity
                .verify_credential("ann@example.com", "changed1")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn reset_validation() {
        let req = ResetPasswordRequest {
            user_id: "u".into(),
            new_password: "abc".into(),
            confirm_password: "abd".into(),
            ..Default::default()
        };
        let messages: Vec<_> = validate_reset(&req, 6).into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec![
                "The field NewPassword must be at least 6 characters long.".to_string(),
                "Passwords do not match.".to_string(),
            ]
        );
    }
}
