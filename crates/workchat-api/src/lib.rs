pub mod config;
pub mod error;
pub mod middleware;
pub mod notice;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

use axum::{
    Router, middleware as layers,
    routing::{get, post},
};

use crate::middleware::{require_admin, require_auth, require_same_origin};
use crate::routes::{account, admin, announcements, chat, home};
use crate::state::AppState;

/// The full route table. Tracing and CORS layers are added by the binary.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(home::root))
        .route("/home", get(home::index))
        .route("/account/login", get(account::login_page).post(account::login))
        .route("/account/logout", post(account::logout));

    let member_routes = Router::new()
        .route("/chat", get(chat::index))
        .route("/chat/room/{id}", get(chat::room))
        .layer(layers::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/admin", get(admin::overview))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/createuser", get(admin::create_user_form).post(admin::create_user))
        .route("/admin/toggleadmin", post(admin::toggle_admin))
        .route(
            "/admin/resetpassword",
            get(admin::reset_password_form).post(admin::reset_password),
        )
        .route("/admin/deleteuser", post(admin::delete_user))
        .route("/admin/announcements", get(admin::announcements))
        .route("/adminannouncements", get(admin::announcements))
        .route(
            "/adminannouncements/create",
            get(announcements::create_form).post(announcements::create),
        )
        .route(
            "/adminannouncements/edit/{id}",
            get(announcements::edit_form).post(announcements::edit),
        )
        .route("/adminannouncements/delete/{id}", post(announcements::delete))
        .layer(layers::from_fn_with_state(state.clone(), require_admin))
        .layer(layers::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .layer(layers::from_fn(require_same_origin))
        .with_state(state)
}
