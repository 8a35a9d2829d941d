//! Per-request context and JSON page rendering.
//!
//! Pages are rendered as JSON view models. Every page carries the current
//! user (if any) and the pending flash message, which is consumed by the
//! render.

use crate::{
    cookies::{self, CLEAR_FLASH_COOKIE, FLASH_COOKIE, SESSION_COOKIE},
    errors::AppResult,
    models::{
        session::SessionToken,
        user::{User, UserId},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::convert::Infallible;

/// What the browser sent about itself: its session token and any flash
/// message queued by the previous response.
///
/// Handlers receive this explicitly and hand the token to the access gate;
/// nothing looks the session up behind their back.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub token: Option<SessionToken>,
    pub flash: Option<String>,
    flash_cookie_present: bool,
}

impl Viewer {
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = cookies::parse_cookie(&parts.headers, SESSION_COOKIE)
            .and_then(|raw| raw.parse::<SessionToken>().ok());
        let raw_flash = cookies::parse_cookie(&parts.headers, FLASH_COOKIE);
        Ok(Viewer {
            token,
            flash: raw_flash.as_deref().and_then(cookies::decode_flash),
            flash_cookie_present: raw_flash.is_some(),
        })
    }
}

/// The logged-in user as shown on pages.
#[derive(Serialize, Debug, Clone)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}

/// Describes an HTML form the page would show.
#[derive(Serialize, Debug, Clone)]
pub struct FormView {
    pub action: String,
    pub method: &'static str,
    pub enctype: &'static str,
    pub fields: &'static [&'static str],
}

impl FormView {
    pub fn urlencoded(action: impl Into<String>, fields: &'static [&'static str]) -> Self {
        Self {
            action: action.into(),
            method: "post",
            enctype: "application/x-www-form-urlencoded",
            fields,
        }
    }

    pub fn multipart(action: impl Into<String>, fields: &'static [&'static str]) -> Self {
        Self {
            action: action.into(),
            method: "post",
            enctype: "multipart/form-data",
            fields,
        }
    }
}

#[derive(Serialize)]
struct Page<T> {
    user: Option<UserView>,
    flash: Option<String>,
    #[serde(flatten)]
    content: T,
}

/// Render `content` as a page for the user `user_id` resolved by the gate.
pub async fn render<T: Serialize>(
    state: &AppState,
    viewer: &Viewer,
    user_id: Option<UserId>,
    content: T,
) -> AppResult<Response> {
    let user = match user_id {
        Some(id) => state.credentials.get_user(id).await?.map(UserView::from),
        None => None,
    };

    let mut response = Json(Page {
        user,
        flash: viewer.flash.clone(),
        content,
    })
    .into_response();

    if viewer.flash_cookie_present {
        response.headers_mut().append(
            header::SET_COOKIE,
            HeaderValue::from_static(CLEAR_FLASH_COOKIE),
        );
    }
    Ok(response)
}
