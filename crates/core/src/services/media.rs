//! Media validation and storage service.

use std::sync::Arc;

use snapfeed_common::{AppError, AppResult, StorageBackend, generate_storage_key};

/// Image extensions accepted for post uploads.
const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Type alias for the storage backend trait object.
pub type Storage = Arc<dyn StorageBackend>;

/// A stored media file.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Storage key (used for later deletion).
    pub key: String,
    /// Public URL the file is served from.
    pub url: String,
}

/// Media service: validates uploaded image bytes and persists them.
#[derive(Clone)]
pub struct MediaService {
    storage: Storage,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Validate and persist an uploaded image.
    ///
    /// The bytes are durably written before this returns; callers may
    /// reference the returned key/url from database rows.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> AppResult<StoredMedia> {
        if data.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }

        image_extension(original_name).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "Only JPG, JPEG, PNG & GIF files are allowed, got {original_name:?}"
            ))
        })?;

        let key = generate_storage_key(original_name);
        self.storage.save(&key, data).await?;

        let url = self.storage.public_url(&key);
        tracing::debug!(key = %key, size = data.len(), "Stored post image");

        Ok(StoredMedia { key, url })
    }

    /// Remove a stored file, best-effort.
    ///
    /// A key with no file behind it is treated as already removed; any other
    /// storage failure is logged and swallowed so callers never block on it.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove stored media");
        }
    }
}

/// The lowercase image extension of a file name, if it is an accepted one.
fn image_extension(name: &str) -> Option<String> {
    let ext = name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < name.len() - 1)
        .map(|pos| name[pos + 1..].to_lowercase())?;

    ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
