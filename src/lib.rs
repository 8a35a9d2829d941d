//! Movie catalog and streaming service: accounts, an admin-managed catalog
//! with poster/video uploads, and public browse and watch pages.

pub mod config;
pub mod cookies;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use anyhow::Result;
use axum::Router;
use config::AppConfig;
use state::AppState;
use std::{path::Path, sync::Arc};

/// Open the database, apply migrations, make sure the upload directory
/// exists and seed first-run data when enabled.
pub async fn prepare(cfg: &AppConfig) -> Result<AppState> {
    cfg.validate()?;
    db::ensure_dir(Path::new(&cfg.upload_dir))?;

    let pool = db::connect(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;

    let state = AppState::new(Arc::new(pool), cfg);
    if cfg.seed {
        seed::seed(&state, &cfg.admin_password).await?;
    }
    tracing::info!(movies = state.catalog.count().await?, "catalog ready");
    Ok(state)
}

/// The full application router with its state attached.
pub fn app(state: AppState, cfg: &AppConfig) -> Router {
    routes::routes::routes(cfg.max_upload_bytes()).with_state(state)
}
