//! HTTP handlers for the public catalog pages, playback and media files.

use crate::{
    errors::{AppError, AppResult},
    handlers::view::{self, Viewer},
    models::movie::Movie,
    services::access_gate::Capability,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

#[derive(Serialize)]
struct MovieList {
    movies: Vec<Movie>,
}

#[derive(Serialize)]
struct MovieDetail {
    movie: Movie,
    poster_url: String,
}

#[derive(Serialize)]
struct Playback {
    movie: Movie,
    poster_url: String,
    video_url: String,
}

/// URL under which a stored blob is served.
pub fn media_url(key: &str) -> String {
    format!("/media/{}", key)
}

/// `GET /` — the catalog, newest first.
pub async fn index(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Anonymous).await?;
    let movies = state.catalog.list().await?;
    view::render(&state, &viewer, user_id, MovieList { movies }).await
}

/// `GET /movie/{id}`
pub async fn movie_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Anonymous).await?;
    let movie = state.catalog.get(id.parse()?).await?;
    let poster_url = media_url(&movie.poster_key);
    view::render(&state, &viewer, user_id, MovieDetail { movie, poster_url }).await
}

/// `GET /watch/{id}` — playback needs a logged-in user.
pub async fn watch(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user_id = state
        .gate
        .authorize(viewer.token(), Capability::Authenticated)
        .await
        .map_err(|err| match err {
            AppError::LoginRequired => AppError::LoginToWatch,
            other => other,
        })?;
    let movie = state.catalog.get(id.parse()?).await?;
    let content = Playback {
        poster_url: media_url(&movie.poster_key),
        video_url: media_url(&movie.video_key),
        movie,
    };
    view::render(&state, &viewer, user_id, content).await
}

/// `GET /media/{key}` — stream a stored poster or video.
pub async fn media(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Response> {
    let (file, len) = state.media().open_blob(&key).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(&key)));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    Ok(response)
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_derived_suffixes() {
        assert_eq!(content_type_for("dune.mp4"), "video/mp4");
        assert_eq!(content_type_for("dune_poster.jpg"), "image/jpeg");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }
}
