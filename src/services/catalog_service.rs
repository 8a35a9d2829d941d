//! src/services/catalog_service.rs
//!
//! CatalogService — owns the `movies` table. Callers must pass the admin
//! check in `AccessGate` before calling any mutating method here.
//!
//! Mutations write media first and commit metadata second. There is no
//! rollback: a failed commit after a successful write leaves an orphaned
//! blob, and deleting a movie leaves its blobs on disk.

use crate::{
    errors::{AppError, AppResult},
    models::movie::{MediaKind, Movie, MovieFields, MovieId},
    services::media_store::{MediaStore, StagedBlob, derive_key},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

const MOVIE_COLUMNS: &str =
    "id, title, description, release_year, genre, poster_key, video_key, created_at";

#[derive(Clone)]
pub struct CatalogService {
    pub db: Arc<SqlitePool>,
    pub media: MediaStore,
}

impl CatalogService {
    pub fn new(db: Arc<SqlitePool>, media: MediaStore) -> Self {
        Self { db, media }
    }

    /// Every movie, newest first.
    pub async fn list(&self) -> AppResult<Vec<Movie>> {
        let query = format!(
            "SELECT {} FROM movies ORDER BY created_at DESC, id DESC",
            MOVIE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Movie>(&query)
            .fetch_all(&*self.db)
            .await?)
    }

    /// Every movie in insertion order, for the admin dashboard.
    pub async fn list_all(&self) -> AppResult<Vec<Movie>> {
        let query = format!("SELECT {} FROM movies ORDER BY id ASC", MOVIE_COLUMNS);
        Ok(sqlx::query_as::<_, Movie>(&query)
            .fetch_all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: MovieId) -> AppResult<Movie> {
        let query = format!("SELECT {} FROM movies WHERE id = ?", MOVIE_COLUMNS);
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| AppError::MovieNotFound(id.to_string()))
    }

    /// Add a movie with both of its staged media files.
    ///
    /// Keys are derived from the title; an existing blob under the same key is
    /// overwritten. Nothing is inserted if either blob fails to land.
    pub async fn create(
        &self,
        fields: MovieFields,
        poster: StagedBlob,
        video: StagedBlob,
    ) -> AppResult<Movie> {
        let fields = check_fields(fields, "/admin/add_movie")?;
        let poster_key = derive_key(&fields.title, MediaKind::Poster);
        let video_key = derive_key(&fields.title, MediaKind::Video);

        self.media.commit_blob(poster, &poster_key).await?;
        self.media.commit_blob(video, &video_key).await?;

        let movie = self.insert(&fields, &poster_key, &video_key).await?;
        info!(movie_id = %movie.id, title = %movie.title, "movie added");
        Ok(movie)
    }

    /// Insert a row whose media are already in place (or deliberately absent).
    pub async fn insert(
        &self,
        fields: &MovieFields,
        poster_key: &str,
        video_key: &str,
    ) -> AppResult<Movie> {
        let query = format!(
            "INSERT INTO movies (title, description, release_year, genre, poster_key, video_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {}",
            MOVIE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Movie>(&query)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.release_year)
            .bind(&fields.genre)
            .bind(poster_key)
            .bind(video_key)
            .bind(Utc::now())
            .fetch_one(&*self.db)
            .await?)
    }

    /// Replace a movie's metadata and whichever media files were supplied.
    ///
    /// A supplied file is stored under a key derived from the *new* title;
    /// media that were not supplied keep their previous keys.
    pub async fn update(
        &self,
        id: MovieId,
        fields: MovieFields,
        poster: Option<StagedBlob>,
        video: Option<StagedBlob>,
    ) -> AppResult<Movie> {
        let current = self.get(id).await?;
        let fields = check_fields(fields, &format!("/admin/edit_movie/{}", id))?;

        let poster_key = match poster {
            Some(staged) => {
                let key = derive_key(&fields.title, MediaKind::Poster);
                self.media.commit_blob(staged, &key).await?;
                key
            }
            None => current.poster_key,
        };
        let video_key = match video {
            Some(staged) => {
                let key = derive_key(&fields.title, MediaKind::Video);
                self.media.commit_blob(staged, &key).await?;
                key
            }
            None => current.video_key,
        };

        let query = format!(
            "UPDATE movies
             SET title = ?, description = ?, release_year = ?, genre = ?, poster_key = ?, video_key = ?
             WHERE id = ?
             RETURNING {}",
            MOVIE_COLUMNS
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(&fields.title)
            .bind(&fields.description)
            .bind(fields.release_year)
            .bind(&fields.genre)
            .bind(&poster_key)
            .bind(&video_key)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| AppError::MovieNotFound(id.to_string()))?;

        info!(movie_id = %movie.id, title = %movie.title, "movie updated");
        Ok(movie)
    }

    /// Remove a movie's row. Its media files stay where they are.
    pub async fn delete(&self, id: MovieId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MovieNotFound(id.to_string()));
        }

        info!(movie_id = %id, "movie deleted");
        debug!(movie_id = %id, "media files retained after delete");
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(&*self.db)
            .await?)
    }
}

/// Parse the release year field of a movie form.
pub fn parse_release_year(raw: &str, redirect: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::validation("Release year must be a whole number", redirect))
}

/// Trim the text fields and require each to be non-empty.
fn check_fields(fields: MovieFields, redirect: &str) -> AppResult<MovieFields> {
    let fields = MovieFields {
        title: fields.title.trim().to_string(),
        description: fields.description.trim().to_string(),
        release_year: fields.release_year,
        genre: fields.genre.trim().to_string(),
    };
    if fields.title.is_empty() || fields.description.is_empty() || fields.genre.is_empty() {
        return Err(AppError::validation(
            "Title, description and genre are required",
            redirect,
        ));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use bytes::Bytes;
    use futures::stream;

    fn fields(title: &str, year: i32) -> MovieFields {
        MovieFields {
            title: title.to_string(),
            description: format!("About {}", title),
            release_year: year,
            genre: "Sci-Fi".to_string(),
        }
    }

    async fn catalog(dir: &tempfile::TempDir) -> CatalogService {
        CatalogService::new(Arc::new(memory_pool().await), MediaStore::new(dir.path()))
    }

    async fn blob(catalog: &CatalogService, bytes: &'static [u8]) -> StagedBlob {
        let chunks: Vec<AppResult<Bytes>> = vec![Ok(Bytes::from_static(bytes))];
        catalog.media.stage_stream(stream::iter(chunks)).await.unwrap()
    }

    fn temp_files(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
            .count()
    }

    #[tokio::test]
    async fn create_derives_keys_and_writes_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let movie = catalog
            .create(
                fields("Dune", 2021),
                blob(&catalog, b"poster").await,
                blob(&catalog, b"video").await,
            )
            .await
            .unwrap();
        assert_eq!(movie.poster_key, "dune_poster.jpg");
        assert_eq!(movie.video_key, "dune.mp4");
        assert_eq!(std::fs::read(dir.path().join("dune_poster.jpg")).unwrap(), b"poster");
        assert_eq!(std::fs::read(dir.path().join("dune.mp4")).unwrap(), b"video");

        let fetched = catalog.get(movie.id).await.unwrap();
        assert_eq!(fetched.title, "Dune");
        assert_eq!(fetched.release_year, 2021);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        for title in ["A", "B", "C"] {
            catalog
                .create(fields(title, 2000), blob(&catalog, b"p").await, blob(&catalog, b"v").await)
                .await
                .unwrap();
        }

        let titles: Vec<_> = catalog.list().await.unwrap().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, ["C", "B", "A"]);

        let admin_order: Vec<_> = catalog
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(admin_order, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn unknown_movie_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        assert!(matches!(
            catalog.get(MovieId(42)).await,
            Err(AppError::MovieNotFound(_))
        ));
        assert!(matches!(
            catalog.delete(MovieId(42)).await,
            Err(AppError::MovieNotFound(_))
        ));
        assert!(matches!(
            catalog.update(MovieId(42), fields("X", 1), None, None).await,
            Err(AppError::MovieNotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_without_files_keeps_keys() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let movie = catalog
            .create(fields("Dune", 2021), blob(&catalog, b"p").await, blob(&catalog, b"v").await)
            .await
            .unwrap();

        let updated = catalog
            .update(movie.id, fields("Dune Part Two", 2024), None, None)
            .await
            .unwrap();
        assert_eq!(updated.title, "Dune Part Two");
        assert_eq!(updated.release_year, 2024);
        assert_eq!(updated.poster_key, "dune_poster.jpg");
        assert_eq!(updated.video_key, "dune.mp4");
        assert_eq!(updated.created_at, movie.created_at);
    }

    #[tokio::test]
    async fn update_with_poster_uses_new_title() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let movie = catalog
            .create(fields("Dune", 2021), blob(&catalog, b"p").await, blob(&catalog, b"v").await)
            .await
            .unwrap();

        let updated = catalog
            .update(
                movie.id,
                fields("Dune Part Two", 2024),
                Some(blob(&catalog, b"p2").await),
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.poster_key, "dune_part_two_poster.jpg");
        assert_eq!(updated.video_key, "dune.mp4");
        assert_eq!(
            std::fs::read(dir.path().join("dune_part_two_poster.jpg")).unwrap(),
            b"p2"
        );
    }

    #[tokio::test]
    async fn delete_keeps_blobs_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let movie = catalog
            .create(fields("Dune", 2021), blob(&catalog, b"p").await, blob(&catalog, b"v").await)
            .await
            .unwrap();

        catalog.delete(movie.id).await.unwrap();
        assert!(matches!(catalog.get(movie.id).await, Err(AppError::MovieNotFound(_))));
        assert!(dir.path().join("dune_poster.jpg").exists());
        assert!(dir.path().join("dune.mp4").exists());
    }

    #[tokio::test]
    async fn same_normalized_title_overwrites_media() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let first = catalog
            .create(
                fields("The Matrix", 1999),
                blob(&catalog, b"old").await,
                blob(&catalog, b"old").await,
            )
            .await
            .unwrap();
        let second = catalog
            .create(
                fields("the matrix", 1999),
                blob(&catalog, b"new").await,
                blob(&catalog, b"new").await,
            )
            .await
            .unwrap();

        assert_eq!(first.poster_key, second.poster_key);
        assert_eq!(std::fs::read(dir.path().join(&first.poster_key)).unwrap(), b"new");
    }

    #[tokio::test]
    async fn failed_blob_write_inserts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let poster = blob(&catalog, b"p").await;
        let video = blob(&catalog, b"v").await;
        std::fs::remove_dir_all(dir.path()).unwrap();

        let err = catalog
            .create(fields("Dune", 2021), poster, video)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;
        let mut bad = fields("Dune", 2021);
        bad.genre = "  ".into();
        assert!(matches!(
            catalog
                .create(bad, blob(&catalog, b"p").await, blob(&catalog, b"v").await)
                .await,
            Err(AppError::Validation { .. })
        ));
        assert_eq!(catalog.count().await.unwrap(), 0);
        assert_eq!(temp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn title_with_ellipsis_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let movie = catalog
            .create(
                fields("Tick, Tick... Boom!", 2021),
                blob(&catalog, b"poster").await,
                blob(&catalog, b"video").await,
            )
            .await
            .unwrap();
        assert_eq!(movie.poster_key, "tick,_tick..._boom!_poster.jpg");
        assert_eq!(movie.video_key, "tick,_tick..._boom!.mp4");
        assert_eq!(std::fs::read(dir.path().join(&movie.video_key)).unwrap(), b"video");
    }

    #[test]
    fn release_year_must_be_numeric() {
        assert_eq!(parse_release_year(" 2021 ", "/admin").unwrap(), 2021);
        assert!(matches!(
            parse_release_year("soon", "/admin/add_movie"),
            Err(AppError::Validation { .. })
        ));
    }
}
