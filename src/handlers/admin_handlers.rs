//! HTTP handlers for the admin area. Every handler passes the admin check
//! before it reads the request body or touches the catalog.
//!
//! Uploaded files are streamed straight into staged temp files; a request
//! that fails before its movie is saved leaves no files behind.

use crate::{
    cookies,
    errors::{AppError, AppResult},
    handlers::view::{self, FormView, Viewer},
    models::movie::{Movie, MovieFields, MovieId},
    services::{
        access_gate::Capability,
        catalog_service::parse_release_year,
        media_store::{MediaStore, StagedBlob},
    },
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::Response,
};
use futures::TryStreamExt;
use serde::Serialize;

const MOVIE_FORM_FIELDS: &[&str] = &[
    "title",
    "description",
    "release_year",
    "genre",
    "poster",
    "video",
];

#[derive(Serialize)]
struct Dashboard {
    movies: Vec<Movie>,
}

#[derive(Serialize)]
struct AddMoviePage {
    form: FormView,
}

#[derive(Serialize)]
struct EditMoviePage {
    movie: Movie,
    form: FormView,
}

/// A parsed admin movie form. Files are staged on disk, not held in memory.
#[derive(Debug, Default)]
struct MovieSubmission {
    title: String,
    description: String,
    release_year: String,
    genre: String,
    poster: Option<StagedBlob>,
    video: Option<StagedBlob>,
}

impl MovieSubmission {
    /// Read every part of the multipart body, streaming file parts into
    /// `media`. File parts without a filename count as "no file chosen".
    async fn read(mut multipart: Multipart, media: &MediaStore, back: &str) -> AppResult<Self> {
        let unreadable = |_: MultipartError| AppError::validation("The upload could not be read", back);
        let mut submission = MovieSubmission::default();

        while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "poster" | "video" => {
                    if !field.file_name().is_some_and(|f| !f.is_empty()) {
                        continue;
                    }
                    let staged = media.stage_stream(field.map_err(unreadable)).await?;
                    if name == "poster" {
                        submission.poster = Some(staged);
                    } else {
                        submission.video = Some(staged);
                    }
                }
                "title" => submission.title = field.text().await.map_err(unreadable)?,
                "description" => submission.description = field.text().await.map_err(unreadable)?,
                "release_year" => submission.release_year = field.text().await.map_err(unreadable)?,
                "genre" => submission.genre = field.text().await.map_err(unreadable)?,
                _ => {}
            }
        }
        Ok(submission)
    }

    fn fields(&self, back: &str) -> AppResult<MovieFields> {
        Ok(MovieFields {
            title: self.title.clone(),
            description: self.description.clone(),
            release_year: parse_release_year(&self.release_year, back)?,
            genre: self.genre.clone(),
        })
    }
}

/// `GET /admin`
pub async fn dashboard(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Admin).await?;
    let movies = state.catalog.list_all().await?;
    view::render(&state, &viewer, user_id, Dashboard { movies }).await
}

/// `GET /admin/add_movie`
pub async fn add_movie_page(State(state): State<AppState>, viewer: Viewer) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Admin).await?;
    let form = FormView::multipart("/admin/add_movie", MOVIE_FORM_FIELDS);
    view::render(&state, &viewer, user_id, AddMoviePage { form }).await
}

/// `POST /admin/add_movie` — both files are required.
pub async fn add_movie(
    State(state): State<AppState>,
    viewer: Viewer,
    multipart: Multipart,
) -> AppResult<Response> {
    state.gate.authorize(viewer.token(), Capability::Admin).await?;

    let back = "/admin/add_movie";
    let submission = MovieSubmission::read(multipart, state.media(), back).await?;
    let fields = submission.fields(back)?;
    let (Some(poster), Some(video)) = (submission.poster, submission.video) else {
        return Err(AppError::validation("Poster and video files are required", back));
    };

    state.catalog.create(fields, poster, video).await?;
    Ok(cookies::redirect_with_flash("/admin", "Movie added successfully"))
}

/// `GET /admin/edit_movie/{id}`
pub async fn edit_movie_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user_id = state.gate.authorize(viewer.token(), Capability::Admin).await?;
    let id: MovieId = id.parse()?;
    let movie = state.catalog.get(id).await?;
    let form = FormView::multipart(format!("/admin/edit_movie/{}", id), MOVIE_FORM_FIELDS);
    view::render(&state, &viewer, user_id, EditMoviePage { movie, form }).await
}

/// `POST /admin/edit_movie/{id}` — files are optional.
pub async fn edit_movie(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    state.gate.authorize(viewer.token(), Capability::Admin).await?;
    let id: MovieId = id.parse()?;

    let back = format!("/admin/edit_movie/{}", id);
    let submission = MovieSubmission::read(multipart, state.media(), &back).await?;
    let fields = submission.fields(&back)?;

    state
        .catalog
        .update(id, fields, submission.poster, submission.video)
        .await?;
    Ok(cookies::redirect_with_flash("/admin", "Movie updated successfully"))
}

/// `GET /admin/delete_movie/{id}` — removes the row; media stay on disk.
pub async fn delete_movie(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state.gate.authorize(viewer.token(), Capability::Admin).await?;
    state.catalog.delete(id.parse()?).await?;
    Ok(cookies::redirect_with_flash("/admin", "Movie deleted successfully"))
}
