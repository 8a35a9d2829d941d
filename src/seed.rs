//! First-run data: the admin account and a few sample movies.

use crate::{errors::AppResult, models::movie::MovieFields, state::AppState};
use tracing::info;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Sample entries; their media files are not shipped, only referenced.
const SAMPLE_MOVIES: [(&str, &str, i32, &str, &str, &str); 3] = [
    (
        "The Matrix",
        "A computer hacker learns about the true nature of reality.",
        1999,
        "Sci-Fi",
        "matrix.jpg",
        "matrix.mp4",
    ),
    (
        "Inception",
        "A thief who steals corporate secrets through dream-sharing technology.",
        2010,
        "Sci-Fi",
        "inception.jpg",
        "inception.mp4",
    ),
    (
        "The Shawshank Redemption",
        "Two imprisoned men bond over a number of years.",
        1994,
        "Drama",
        "shawshank.jpg",
        "shawshank.mp4",
    ),
];

/// Create the admin account if missing. The sample movies are added only
/// together with a newly created admin, so restarts never duplicate them.
pub async fn seed(state: &AppState, admin_password: &str) -> AppResult<()> {
    let created = state
        .credentials
        .ensure_admin(ADMIN_USERNAME, ADMIN_EMAIL, admin_password)
        .await?;
    if !created {
        return Ok(());
    }

    for (title, description, release_year, genre, poster_key, video_key) in SAMPLE_MOVIES {
        let fields = MovieFields {
            title: title.to_string(),
            description: description.to_string(),
            release_year,
            genre: genre.to_string(),
        };
        state.catalog.insert(&fields, poster_key, video_key).await?;
    }
    info!(movies = SAMPLE_MOVIES.len(), "seeded admin account and sample movies");
    Ok(())
}
