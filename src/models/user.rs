//! Registered accounts.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Primary key of a `users` row.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user account.
///
/// Usernames and emails are each unique across all users. Accounts are never
/// edited or deleted once created.
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct User {
    pub id: UserId,

    pub username: String,

    pub email: String,

    /// Argon2 PHC string; never rendered.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub is_admin: bool,
}

/// Result of a successful password check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub is_admin: bool,
}
