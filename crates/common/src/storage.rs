//! File storage backend for uploaded post images.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Storage backend trait for file operations.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Save file data under the given storage key.
    ///
    /// The write must be durable before this returns `Ok`.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Delete a file. Deleting a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);

        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.path_for(key).exists())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Generate a storage key unique across concurrent uploads.
///
/// Combines a fresh ULID with the sanitized base name of the original file,
/// so the key stays collision-free while remaining recognizable.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    let base = sanitize_file_name(original_name);
    format!("{}-{base}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Strip path components and anything outside `[A-Za-z0-9._-]` from a
/// client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
