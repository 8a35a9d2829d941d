//! Defines every route of the movie catalog.
//!
//! ## Structure
//! - **Public pages**
//!   - `GET  /`                 — catalog, newest first
//!   - `GET  /movie/{id}`       — movie detail
//!   - `GET  /media/{key}`      — stored poster or video
//!
//! - **Accounts**
//!   - `GET|POST /register`, `GET|POST /login`, `GET /logout`
//!
//! - **Logged-in users**
//!   - `GET  /watch/{id}`       — playback page
//!
//! - **Admins**
//!   - `GET  /admin`                           — dashboard
//!   - `GET|POST /admin/add_movie`             — create (multipart)
//!   - `GET|POST /admin/edit_movie/{id}`       — update (multipart)
//!   - `GET  /admin/delete_movie/{id}`         — delete

use crate::{
    handlers::{
        admin_handlers::{
            add_movie, add_movie_page, dashboard, delete_movie, edit_movie, edit_movie_page,
        },
        auth_handlers::{login, login_page, logout, register, register_page},
        health_handlers::{healthz, readyz},
        movie_handlers::{index, media, movie_detail, watch},
    },
    state::AppState,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// Build the router. Admin upload routes accept bodies up to `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // public pages
        .route("/", get(index))
        .route("/movie/{id}", get(movie_detail))
        .route("/media/{key}", get(media))
        // accounts
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        // logged-in users
        .route("/watch/{id}", get(watch))
        // admins
        .route("/admin", get(dashboard))
        .route(
            "/admin/add_movie",
            get(add_movie_page)
                .post(add_movie)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/admin/edit_movie/{id}",
            get(edit_movie_page)
                .post(edit_movie)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/admin/delete_movie/{id}", get(delete_movie))
}
