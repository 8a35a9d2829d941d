//! Cookie plumbing for the session token and one-shot flash messages.

use axum::{
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

pub const SESSION_COOKIE: &str = "movie_session";
pub const FLASH_COOKIE: &str = "flash";

/// Expires the flash cookie once its message has been shown.
pub const CLEAR_FLASH_COOKIE: &str = "flash=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0";

/// Find cookie `name` in the request's `Cookie` headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(s) = value.to_str() else { continue };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        max_age_secs,
        secure_attr(secure)
    )
}

pub fn clear_session_cookie(secure: bool) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        SESSION_COOKIE,
        secure_attr(secure)
    )
}

pub fn flash_cookie(message: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        FLASH_COOKIE,
        URL_SAFE_NO_PAD.encode(message)
    )
}

/// Decode a flash cookie value; garbage and empty values read as no message.
pub fn decode_flash(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

/// `303 See Other` to `target` with `message` queued for the next page.
pub fn redirect_with_flash(target: &str, message: &str) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash_cookie(message))]),
        Redirect::to(target),
    )
        .into_response()
}

fn secure_attr(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}
