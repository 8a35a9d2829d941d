//! HTTP handlers for registration, login and logout.

use crate::{
    cookies,
    errors::AppResult,
    handlers::view::{self, FormView, Viewer},
    services::access_gate::Capability,
    state::AppState,
};
use axum::{
    Form,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Body of `POST /register`. Missing fields arrive empty and fail validation.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
struct FormPage {
    form: FormView,
}

/// `GET /register`
pub async fn register_page(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Anonymous).await?;
    let form = FormView::urlencoded("/register", &["username", "email", "password"]);
    view::render(&state, &viewer, user_id, FormPage { form }).await
}

/// `POST /register` — create an account, then send the user to log in.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    state
        .credentials
        .register(&form.username, &form.email, &form.password)
        .await?;
    Ok(cookies::redirect_with_flash(
        "/login",
        "Registration successful! Please login.",
    ))
}

/// `GET /login`
pub async fn login_page(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Anonymous).await?;
    let form = FormView::urlencoded("/login", &["username", "password"]);
    view::render(&state, &viewer, user_id, FormPage { form }).await
}

/// `POST /login` — start a session. Admins land on the dashboard.
pub async fn login(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let user = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?;

    // A browser holds one session at a time.
    if let Some(previous) = viewer.token() {
        state.sessions.end_session(previous).await?;
    }
    let token = state.sessions.start_session(user.id).await?;
    info!(user_id = %user.id, username = %form.username, "logged in");

    let cookie = cookies::session_cookie(
        &token.to_string(),
        state.cookies.max_age_secs,
        state.cookies.secure,
    );
    let target = if user.is_admin { "/admin" } else { "/" };
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(target),
    )
        .into_response())
}

/// `GET /logout` — always succeeds, logged in or not.
pub async fn logout(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    if let Some(token) = viewer.token() {
        state.sessions.end_session(token).await?;
    }
    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            cookies::clear_session_cookie(state.cookies.secure),
        )]),
        Redirect::to("/"),
    )
        .into_response())
}
