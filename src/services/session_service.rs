//! src/services/session_service.rs
//!
//! SessionService — maps opaque session tokens to user ids. Sessions live in
//! their own table; nothing about them is kept in process memory, so every
//! request resolves its token independently.

use crate::{
    errors::AppResult,
    models::{
        session::{Session, SessionToken},
        user::UserId,
    },
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SessionService {
    pub db: Arc<SqlitePool>,

    /// How long a session stays valid after login.
    pub ttl: Duration,
}

impl SessionService {
    pub fn new(db: Arc<SqlitePool>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Bind a fresh token to `user_id`. Expired sessions of any user are
    /// purged on the way.
    pub async fn start_session(&self, user_id: UserId) -> AppResult<SessionToken> {
        self.purge_expired().await?;

        let token = SessionToken::generate();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(now)
        .bind(now + self.ttl)
        .execute(&*self.db)
        .await?;

        info!(user_id = %user_id, "session started");
        Ok(token)
    }

    /// The user bound to `token`, or `None` when the token is unknown or expired.
    pub async fn resolve(&self, token: &SessionToken) -> AppResult<Option<UserId>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await?;

        Ok(match session {
            Some(s) if s.expires_at > Utc::now() => Some(s.user_id),
            Some(s) => {
                debug!(user_id = %s.user_id, "session expired");
                None
            }
            None => None,
        })
    }

    /// Invalidate `token`. Ending an unknown or already-ended session is a no-op.
    pub async fn end_session(&self, token: &SessionToken) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() > 0 {
            info!("session ended");
        }
        Ok(())
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&*self.db)
            .await?;
        if result.rows_affected() > 0 {
            debug!(removed = result.rows_affected(), "purged expired sessions");
        }
        Ok(result.rows_affected())
    }
}
