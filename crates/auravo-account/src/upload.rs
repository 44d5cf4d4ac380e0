//! Media hosting for avatars.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::AccountError;

/// Stores an uploaded file and returns the URL it is served from.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, bytes: &[u8]) -> Result<String, AccountError>;
}

/// Uploader writing into `<data_dir>/media/` and returning `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    dir: PathBuf,
}

impl LocalMediaStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("media"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl MediaUploader for LocalMediaStore {
    async fn upload(&self, bytes: &[u8]) -> Result<String, AccountError> {
        if bytes.is_empty() {
            return Err(AccountError::Upload("file is empty".to_string()));
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AccountError::Upload(format!("{}: {}", self.dir.display(), e)))?;

        let path = self
            .dir
            .join(format!("{}.{}", Uuid::new_v4(), extension_for(bytes)));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AccountError::Upload(format!("{}: {}", path.display(), e)))?;

        let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        let url = format!("file://{}", path.display());
        info!(url = %url, bytes = bytes.len(), "Media stored");
        Ok(url)
    }
}

/// File extension guessed from the leading magic bytes.
fn extension_for(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xff, 0xd8, 0xff, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "bin",
    }
}
