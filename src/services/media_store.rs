//! src/services/media_store.rs
//!
//! MediaStore — the blob store for posters and videos. Blobs are plain files
//! directly under the upload directory, named by a key derived from the movie
//! title. Two titles that normalize to the same key share (and overwrite) the
//! same files.
//!
//! Uploads are staged: streamed into a temp file first, then renamed onto
//! their key once the caller knows it.

use crate::{
    errors::{AppError, AppResult},
    models::movie::MediaKind,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_KEY_LEN: usize = 255;

/// Derive the blob key for `title`: lowercase, spaces to underscores, then
/// the kind's suffix. `"The Matrix"` and `"the matrix"` give the same key.
pub fn derive_key(title: &str, kind: MediaKind) -> String {
    let mut key = title.to_lowercase().replace(' ', "_");
    key.push_str(kind.key_suffix());
    key
}

/// An upload written to a temp file in the upload directory but not yet
/// placed under a key. Dropping it without committing removes the temp file.
#[derive(Debug)]
pub struct StagedBlob {
    path: PathBuf,
    size: u64,
    committed: bool,
}

impl StagedBlob {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn temp_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "could not remove staged upload");
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediaStore {
    /// Directory holding every blob.
    pub base_path: PathBuf,
}

impl MediaStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Keys name a single file in the upload directory and nothing else.
    /// Dots inside a name are fine; path separators are not.
    fn ensure_key_safe(key: &str) -> AppResult<()> {
        let unsafe_key = key.is_empty()
            || key.len() > MAX_KEY_LEN
            || key == "."
            || key == ".."
            || key
                .chars()
                .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());
        if unsafe_key {
            return Err(AppError::InvalidMediaKey(key.to_string()));
        }
        Ok(())
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Write an upload to a temp file chunk by chunk, without holding it in
    /// memory. The first error from the stream or the disk aborts staging.
    pub async fn stage_stream<S>(&self, stream: S) -> AppResult<StagedBlob>
    where
        S: Stream<Item = AppResult<Bytes>>,
    {
        let path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&path).await?;
        let mut staged = StagedBlob {
            path,
            size: 0,
            committed: false,
        };

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            staged.size += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(staged)
    }

    /// Move a staged upload under `key`, replacing any previous blob.
    ///
    /// Errors are returned as-is; nothing is retried. On failure the staged
    /// temp file is removed when `staged` drops.
    pub async fn commit_blob(&self, mut staged: StagedBlob, key: &str) -> AppResult<()> {
        Self::ensure_key_safe(key)?;
        let final_path = self.blob_path(key);

        if let Err(err) = fs::rename(&staged.path, &final_path).await {
            if err.kind() != ErrorKind::AlreadyExists {
                return Err(AppError::Storage(err));
            }
            fs::remove_file(&final_path).await?;
            fs::rename(&staged.path, &final_path).await?;
        }
        staged.committed = true;

        debug!(key, size = staged.size, "stored blob");
        Ok(())
    }

    /// Open a blob for streaming, along with its size in bytes.
    pub async fn open_blob(&self, key: &str) -> AppResult<(File, u64)> {
        Self::ensure_key_safe(key).map_err(|_| AppError::MediaNotFound(key.to_string()))?;
        let file = File::open(self.blob_path(key)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                AppError::MediaNotFound(key.to_string())
            } else {
                AppError::Storage(err)
            }
        })?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }
}
