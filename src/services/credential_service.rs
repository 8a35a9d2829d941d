//! src/services/credential_service.rs
//!
//! CredentialService — owns the `users` table. Passwords are hashed with
//! Argon2 and a random salt; the plaintext never leaves this module and is
//! never logged.

use crate::{
    errors::{AppError, AppResult},
    models::user::{AuthenticatedUser, User, UserId},
};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CredentialService {
    pub db: Arc<SqlitePool>,
}

impl CredentialService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create a regular (non-admin) account.
    ///
    /// The username is checked before the email, so a request clashing on
    /// both reports `DuplicateUsername`.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<UserId> {
        self.insert_user(username, email, password, false).await
    }

    /// Check a username/password pair. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthenticatedUser> {
        let username = username.trim();
        let Some(user) = self.find_by_username(username).await? else {
            debug!(username, "login for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await?;
        if !verified {
            debug!(username, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthenticatedUser {
            id: user.id,
            is_admin: user.is_admin,
        })
    }

    pub async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, is_admin FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, is_admin FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    /// Create an admin account named `username` unless one with that name
    /// already exists. Returns whether an account was created.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> AppResult<bool> {
        if self.find_by_username(username).await?.is_some() {
            return Ok(false);
        }
        self.insert_user(username, email, password, true).await?;
        Ok(true)
    }

    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> AppResult<UserId> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "Username, email and password are required",
                "/register",
            ));
        }

        if self.exists("username", username).await? {
            return Err(AppError::DuplicateUsername);
        }
        if self.exists("email", email).await? {
            return Err(AppError::DuplicateEmail);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let id = sqlx::query_scalar::<_, UserId>(
            "INSERT INTO users (username, email, password_hash, is_admin)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .bind(is_admin)
        .fetch_one(&*self.db)
        .await
        .map_err(map_unique_violation)?;

        info!(user_id = %id, username, is_admin, "registered user");
        Ok(id)
    }

    async fn exists(&self, column: &'static str, value: &str) -> AppResult<bool> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {} = ?)", column);
        let found = sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .fetch_one(&*self.db)
            .await?;
        Ok(found)
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AppError::Internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::Internal(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Translate a UNIQUE constraint failure from a racing insert into the
/// matching duplicate error.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        let message = db_err.message().to_ascii_lowercase();
        if message.contains("unique") {
            if message.contains("users.username") {
                return AppError::DuplicateUsername;
            }
            if message.contains("users.email") {
                return AppError::DuplicateEmail;
            }
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    async fn service() -> CredentialService {
        CredentialService::new(Arc::new(memory_pool().await))
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let creds = service().await;
        let id = creds.register("alice", "a@x.com", "pw1").await.unwrap();

        let auth = creds.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(auth.id, id);
        assert!(!auth.is_admin);

        assert!(matches!(
            creds.authenticate("alice", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            creds.authenticate("nobody", "pw1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_leaves_first_user_unchanged() {
        let creds = service().await;
        let id = creds.register("alice", "a@x.com", "pw1").await.unwrap();

        let err = creds.register("alice", "other@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));

        let user = creds.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");
        assert!(creds.authenticate("alice", "pw1").await.is_ok());
        assert!(creds.authenticate("alice", "pw2").await.is_err());
    }

    #[tokio::test]
    async fn login_accepts_the_name_as_typed_at_registration() {
        let creds = service().await;
        let id = creds.register(" bob ", "b@x.com", "pw1").await.unwrap();

        assert_eq!(creds.get_user(id).await.unwrap().unwrap().username, "bob");
        assert_eq!(creds.authenticate(" bob ", "pw1").await.unwrap().id, id);
        assert_eq!(creds.authenticate("bob", "pw1").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let creds = service().await;
        creds.register("alice", "a@x.com", "pw1").await.unwrap();
        let err = creds.register("bob", "a@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let creds = service().await;
        let id = creds.register("alice", "a@x.com", "pw1").await.unwrap();
        let user = creds.get_user(id).await.unwrap().unwrap();
        assert_ne!(user.password_hash, "pw1");
        assert!(user.password_hash.starts_with("$argon2"));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let creds = service().await;
        assert!(matches!(
            creds.register("  ", "a@x.com", "pw").await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            creds.register("alice", "", "pw").await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn ensure_admin_only_creates_once() {
        let creds = service().await;
        assert!(creds.ensure_admin("admin", "admin@example.com", "admin123").await.unwrap());
        assert!(!creds.ensure_admin("admin", "admin@example.com", "changed").await.unwrap());

        let auth = creds.authenticate("admin", "admin123").await.unwrap();
        assert!(auth.is_admin);
    }
}
