//! Core data models for the movie catalog.
//!
//! These entities map to the `users`, `movies` and `sessions` tables via
//! `sqlx::FromRow` and serialize as JSON view models via `serde`.

pub mod movie;
pub mod session;
pub mod user;
