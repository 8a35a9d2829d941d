//! Shared state injected into every handler.

use crate::{
    config::AppConfig,
    services::{
        access_gate::AccessGate, catalog_service::CatalogService,
        credential_service::CredentialService, media_store::MediaStore,
        session_service::SessionService,
    },
};
use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;

/// How the session cookie is issued.
#[derive(Clone, Copy, Debug)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub credentials: CredentialService,
    pub sessions: SessionService,
    pub gate: AccessGate,
    pub catalog: CatalogService,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, cfg: &AppConfig) -> Self {
        let ttl = Duration::hours(cfg.session_ttl_hours);
        let credentials = CredentialService::new(db.clone());
        let sessions = SessionService::new(db.clone(), ttl);
        let gate = AccessGate::new(sessions.clone(), credentials.clone());
        let catalog = CatalogService::new(db.clone(), MediaStore::new(&cfg.upload_dir));
        Self {
            db,
            credentials,
            sessions,
            gate,
            catalog,
            cookies: CookieSettings {
                secure: cfg.cookie_secure,
                max_age_secs: ttl.num_seconds(),
            },
        }
    }

    pub fn media(&self) -> &MediaStore {
        &self.catalog.media
    }
}
