//! Catalog entries and the kinds of media attached to them.

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Primary key of a `movies` row.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MovieId(pub i64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ids arrive as raw path segments; anything that is not a number names no movie.
impl FromStr for MovieId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(MovieId)
            .map_err(|_| AppError::MovieNotFound(s.to_string()))
    }
}

/// A movie in the catalog.
///
/// The struct carries metadata plus the blob-store keys of the poster and
/// video, not the media bytes themselves.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Movie {
    pub id: MovieId,

    pub title: String,

    pub description: String,

    pub release_year: i32,

    pub genre: String,

    /// Blob key of the poster image (e.g. `dune_poster.jpg`).
    pub poster_key: String,

    /// Blob key of the video file (e.g. `dune.mp4`).
    pub video_key: String,

    /// When the movie was added; never changes afterwards.
    pub created_at: DateTime<Utc>,
}

/// Editable metadata of a movie, as submitted by an admin form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub genre: String,
}

/// The two media files every movie has.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Poster,
    Video,
}

impl MediaKind {
    /// Suffix appended to the normalized title to form the blob key.
    pub fn key_suffix(self) -> &'static str {
        match self {
            MediaKind::Poster => "_poster.jpg",
            MediaKind::Video => ".mp4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_id_is_not_found() {
        assert_eq!("42".parse::<MovieId>().unwrap(), MovieId(42));
        assert!(matches!(
            "abc".parse::<MovieId>(),
            Err(AppError::MovieNotFound(raw)) if raw == "abc"
        ));
    }
}
