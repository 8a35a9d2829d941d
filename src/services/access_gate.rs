//! src/services/access_gate.rs
//!
//! AccessGate — the single authorization decision made before any catalog
//! mutation, the admin dashboard, and playback.

use crate::{
    errors::{AppError, AppResult},
    models::{session::SessionToken, user::UserId},
    services::{credential_service::CredentialService, session_service::SessionService},
};
use tracing::warn;

/// What a route requires of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Anyone, logged in or not.
    Anonymous,
    /// Any live session.
    Authenticated,
    /// A live session whose user has the admin flag.
    Admin,
}

#[derive(Clone)]
pub struct AccessGate {
    pub sessions: SessionService,
    pub credentials: CredentialService,
}

impl AccessGate {
    pub fn new(sessions: SessionService, credentials: CredentialService) -> Self {
        Self {
            sessions,
            credentials,
        }
    }

    /// Decide whether the holder of `token` may do something needing `required`.
    ///
    /// The session is always resolved first; only a resolved user is checked
    /// for the admin flag. Returns the resolved user id, which is `None` only
    /// for anonymous callers of an `Anonymous` operation.
    pub async fn authorize(
        &self,
        token: Option<&SessionToken>,
        required: Capability,
    ) -> AppResult<Option<UserId>> {
        let resolved = match token {
            Some(token) => self.sessions.resolve(token).await?,
            None => None,
        };

        match required {
            Capability::Anonymous => Ok(resolved),
            Capability::Authenticated => resolved.map(Some).ok_or(AppError::LoginRequired),
            Capability::Admin => {
                let user_id = resolved.ok_or(AppError::LoginRequired)?;
                let Some(user) = self.credentials.get_user(user_id).await? else {
                    warn!(user_id = %user_id, "session refers to a missing user");
                    return Err(AppError::LoginRequired);
                };
                if !user.is_admin {
                    warn!(user_id = %user_id, username = %user.username, "admin access denied");
                    return Err(AppError::AccessDenied);
                }
                Ok(Some(user_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        gate: AccessGate,
        alice: UserId,
        admin: UserId,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(memory_pool().await);
        let credentials = CredentialService::new(db.clone());
        let alice = credentials.register("alice", "a@x.com", "pw1").await.unwrap();
        credentials
            .ensure_admin("admin", "admin@example.com", "admin123")
            .await
            .unwrap();
        let admin = credentials.authenticate("admin", "admin123").await.unwrap().id;
        let sessions = SessionService::new(db, Duration::hours(1));
        Fixture {
            gate: AccessGate::new(sessions, credentials),
            alice,
            admin,
        }
    }

    #[tokio::test]
    async fn anonymous_always_passes() {
        let f = fixture().await;
        assert_eq!(f.gate.authorize(None, Capability::Anonymous).await.unwrap(), None);

        let token = f.gate.sessions.start_session(f.alice).await.unwrap();
        assert_eq!(
            f.gate.authorize(Some(&token), Capability::Anonymous).await.unwrap(),
            Some(f.alice)
        );
    }

    #[tokio::test]
    async fn authenticated_requires_a_live_session() {
        let f = fixture().await;
        assert!(matches!(
            f.gate.authorize(None, Capability::Authenticated).await,
            Err(AppError::LoginRequired)
        ));
        assert!(matches!(
            f.gate
                .authorize(Some(&SessionToken::generate()), Capability::Authenticated)
                .await,
            Err(AppError::LoginRequired)
        ));

        let token = f.gate.sessions.start_session(f.alice).await.unwrap();
        assert_eq!(
            f.gate.authorize(Some(&token), Capability::Authenticated).await.unwrap(),
            Some(f.alice)
        );
    }

    #[tokio::test]
    async fn admin_denies_regular_users_and_redirects_anonymous() {
        let f = fixture().await;
        assert!(matches!(
            f.gate.authorize(None, Capability::Admin).await,
            Err(AppError::LoginRequired)
        ));

        let token = f.gate.sessions.start_session(f.alice).await.unwrap();
        assert!(matches!(
            f.gate.authorize(Some(&token), Capability::Admin).await,
            Err(AppError::AccessDenied)
        ));

        let admin_token = f.gate.sessions.start_session(f.admin).await.unwrap();
        assert_eq!(
            f.gate.authorize(Some(&admin_token), Capability::Admin).await.unwrap(),
            Some(f.admin)
        );
    }

    #[tokio::test]
    async fn ended_admin_session_needs_login_again() {
        let f = fixture().await;
        let token = f.gate.sessions.start_session(f.admin).await.unwrap();
        f.gate.sessions.end_session(&token).await.unwrap();
        assert!(matches!(
            f.gate.authorize(Some(&token), Capability::Admin).await,
            Err(AppError::LoginRequired)
        ));
    }
}
