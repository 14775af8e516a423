//! File storage
//!
//! Local-disk store for uploaded images. Callers hand in raw bytes and get
//! back a public URL path; nothing else in the system ever touches the bytes
//! again.

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::AppError;

/// URL prefix under which stored files are served.
const PUBLIC_PREFIX: &str = "/media";

/// Stores uploaded files under a media directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    media_dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    /// Persist `data` under a fresh name and return its public URL path.
    pub async fn save(&self, data: &[u8], extension: &str) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|e| AppError::Internal(format!("create media dir: {e}")))?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.media_dir.join(&filename);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Stored uploaded file");

        Ok(format!("{PUBLIC_PREFIX}/{filename}"))
    }
}
