use crate::cookies;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::io;
use thiserror::Error;

/// Every failure a request can end in.
///
/// Page routes turn an error into a redirect carrying a flash message, so the
/// browser always lands somewhere reachable.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already exists")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("login required")]
    LoginRequired,
    #[error("login required to watch")]
    LoginToWatch,
    #[error("access denied")]
    AccessDenied,
    #[error("movie `{0}` not found")]
    MovieNotFound(String),
    #[error("media `{0}` not found")]
    MediaNotFound(String),
    #[error("{message}")]
    Validation { message: String, redirect: String },
    #[error("media key `{0}` is not a plain file name")]
    InvalidMediaKey(String),
    #[error("storing media failed: {0}")]
    Storage(#[from] io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shortcut for a validation failure that sends the user back to `redirect`.
    pub fn validation(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    /// Page the browser is sent to after this error.
    pub fn redirect_target(&self) -> &str {
        match self {
            AppError::DuplicateUsername | AppError::DuplicateEmail => "/register",
            AppError::InvalidCredentials | AppError::LoginRequired | AppError::LoginToWatch => {
                "/login"
            }
            AppError::Validation { redirect, .. } => redirect.as_str(),
            AppError::InvalidMediaKey(_) | AppError::Storage(_) => "/admin",
            AppError::AccessDenied
            | AppError::MovieNotFound(_)
            | AppError::MediaNotFound(_)
            | AppError::Database(_)
            | AppError::Internal(_) => "/",
        }
    }

    /// Message shown to the user on the page they are redirected to.
    pub fn flash_message(&self) -> String {
        match self {
            AppError::DuplicateUsername => "Username already exists".into(),
            AppError::DuplicateEmail => "Email already exists".into(),
            AppError::InvalidCredentials => "Please check your login details and try again.".into(),
            AppError::LoginRequired => "Please login to continue".into(),
            AppError::LoginToWatch => "Please login to watch movies".into(),
            AppError::AccessDenied => "Access denied".into(),
            AppError::MovieNotFound(_) | AppError::MediaNotFound(_) => "Movie not found".into(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidMediaKey(_) | AppError::Storage(_) => "Failed to store media".into(),
            AppError::Database(_) | AppError::Internal(_) => "Something went wrong".into(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Storage(_) => {
                tracing::error!(error = %self, "request failed");
            }
            AppError::LoginRequired | AppError::LoginToWatch | AppError::AccessDenied => {
                tracing::warn!(error = %self, "request denied");
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }

        // Media is fetched by players, not navigated to.
        if let AppError::MediaNotFound(_) = self {
            let body = Json(json!({
                "error": self.to_string(),
                "status": StatusCode::NOT_FOUND.as_u16()
            }));
            return (StatusCode::NOT_FOUND, body).into_response();
        }

        cookies::redirect_with_flash(self.redirect_target(), &self.flash_message())
    }
}
