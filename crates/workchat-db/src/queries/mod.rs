pub mod announcements;
pub mod roles;
pub mod rooms;
pub mod tokens;
pub mod users;
