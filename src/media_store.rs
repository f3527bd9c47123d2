use crate::types::GeoPoint;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

/// Result of pushing an upload through the media pipeline. `gps` carries
/// coordinates the pipeline could extract from the file, when any.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub gps: Option<GeoPoint>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError>;
}

/// Disk-backed store. Files land under the configured root with a uuid
/// prefix and are served back under `/uploads`. This store performs no
/// metadata extraction, so `gps` is always None here.
pub struct LocalMediaStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_prefix: "/uploads".to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn safe_name(filename: &str) -> String {
        let base = std::path::Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        base.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Validation("Uploaded file is empty.".to_string()));
        }

        let stored_name = format!("{}-{}", Uuid::new_v4(), Self::safe_name(filename));
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "stored media file");

        Ok(StoredMedia {
            url: format!("{}/{}", self.public_prefix, stored_name),
            gps: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized_to_safe_characters() {
        assert_eq!(LocalMediaStore::safe_name("photo.jpg"), "photo.jpg");
        assert_eq!(LocalMediaStore::safe_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(LocalMediaStore::safe_name("../../etc/passwd"), "passwd");
        assert_eq!(LocalMediaStore::safe_name(""), "upload");
    }
}
