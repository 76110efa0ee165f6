pub mod api;
pub mod form;
pub mod models;
pub mod paging;

/// Name of the role that unlocks the admin surface.
pub const ADMIN_ROLE: &str = "Admin";
