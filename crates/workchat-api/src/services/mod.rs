//! Operations behind the HTTP handlers. Each takes the shared state
//! synchronously and is run through [`crate::state::blocking`].

pub mod announcements;
pub mod chat;
pub mod home;
pub mod seed;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
