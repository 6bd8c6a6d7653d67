use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::crypto::random_hex;
use crate::error::{AppError, Result, msg};

/// Opaque object storage. Keys are generated by [`new_object_key`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Object bytes, or None if no object exists under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Generate an unguessable key: `folder/<32 hex chars>.<ext>`.
///
/// Only the original file's extension survives, restricted to a short
/// alphanumeric suffix.
pub fn new_object_key(folder: &str, original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());

    let name = random_hex(16);
    match ext {
        Some(ext) => format!("{}/{}.{}", folder.trim_matches('/'), name, ext),
        None => format!("{}/{}", folder.trim_matches('/'), name),
    }
}

/// Keys are relative paths of `[A-Za-z0-9._-]` segments; no `..`, no empty segments.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        })
}

/// Blob store backed by a local directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(AppError::BadRequest(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create storage directory {}: {}", parent.display(), e);
                AppError::UpstreamUnavailable(msg::STORAGE_UNAVAILABLE.into())
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write object {}: {}", key, e);
            AppError::UpstreamUnavailable(msg::STORAGE_UNAVAILABLE.into())
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!("Failed to read object {}: {}", key, e);
                Err(AppError::UpstreamUnavailable(msg::STORAGE_UNAVAILABLE.into()))
            }
        }
    }
}
