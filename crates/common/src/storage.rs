//! Storage for uploaded post images.
//!
//! Files are addressed by a key of the form `<dir>/<file name>`, where the
//! directory names the owning entity type (`posts` for post images). Writing
//! to an existing key replaces the stored bytes, so uploads pick a free key
//! with [`available_key`] first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::{AppError, AppResult};

/// Directory used for post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Storage key (relative path).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a file under `key`, replacing any previous content.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredFile>;

    /// Delete a file. Missing files are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Build the storage key for an uploaded file.
///
/// Only the final path component of `file_name` is kept, so client supplied
/// names such as `../../etc/passwd` or `C:\photos\cat.png` cannot escape `dir`.
pub fn storage_key(dir: &str, file_name: &str) -> AppResult<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(AppError::Validation(format!(
            "image: invalid file name {file_name:?}"
        )));
    }

    Ok(format!("{dir}/{base}"))
}

/// Split a key into stem and extension (with its dot). Leading dots of the
/// file name are part of the stem.
fn split_extension(key: &str) -> (&str, &str) {
    let start = key.rfind('/').map_or(0, |idx| idx + 1);
    match key[start..].rfind('.') {
        Some(idx) if idx > 0 => key.split_at(start + idx),
        _ => (key, ""),
    }
}

/// Pick a key for an upload that is not taken in `storage`.
///
/// The plain `<dir>/<file name>` key is used when free; otherwise a random
/// suffix is added to the stem, e.g. `posts/photo_3f9a2c1.gif`.
pub async fn available_key(
    storage: &dyn StorageBackend,
    dir: &str,
    file_name: &str,
) -> AppResult<String> {
    let key = storage_key(dir, file_name)?;
    if !storage.exists(&key).await? {
        return Ok(key);
    }

    let (stem, ext) = split_extension(&key);
    loop {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let candidate = format!("{stem}_{}{ext}", &suffix[..7]);
        if !storage.exists(&candidate).await? {
            return Ok(candidate);
        }
    }
}

/// Local filesystem storage backend.
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

    /// Root directory of stored files.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredFile> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored file");

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        tokio::fs::try_exists(self.base_path.join(key))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}

/// Storage backend that keeps files in memory. Used by tests.
#[derive(Default)]
pub struct InMemoryStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back the bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(key).cloned()
    }
}

#[async_trait::async_trait]
impl StorageBackend for InMemoryStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredFile> {
        self.files
            .write()
            .await
            .insert(key.to_string(), data.to_vec());

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.files.write().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/media/{key}")
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.files.read().await.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_uses_dir_and_file_name() {
        assert_eq!(
            storage_key(POST_IMAGE_DIR, "small.gif").unwrap(),
            "posts/small.gif"
        );
    }

    #[test]
    fn test_storage_key_strips_directories() {
        assert_eq!(
            storage_key(POST_IMAGE_DIR, "../../secret/small.gif").unwrap(),
            "posts/small.gif"
        );
        assert_eq!(
            storage_key(POST_IMAGE_DIR, r"C:\pictures\cat.png").unwrap(),
            "posts/cat.png"
        );
    }

    #[test]
    fn test_storage_key_rejects_empty_names() {
        assert!(matches!(
            storage_key(POST_IMAGE_DIR, ""),
            Err(AppError::Validation(_))
        ));
        assert!(storage_key(POST_IMAGE_DIR, "dir/").is_err());
        assert!(storage_key(POST_IMAGE_DIR, "..").is_err());
    }

    #[tokio::test]
    async fn test_available_key_keeps_free_name() {
        let storage = InMemoryStorage::new();

        let key = available_key(&storage, POST_IMAGE_DIR, "photo.gif").await.unwrap();

        assert_eq!(key, "posts/photo.gif");
    }

    #[tokio::test]
    async fn test_available_key_suffixes_taken_name() {
        let storage = InMemoryStorage::new();
        storage.put("posts/photo.gif", b"one", "image/gif").await.unwrap();

        let key = available_key(&storage, POST_IMAGE_DIR, "photo.gif").await.unwrap();

        assert_ne!(key, "posts/photo.gif");
        assert!(key.starts_with("posts/photo_"));
        assert!(key.ends_with(".gif"));
        assert_eq!(key.len(), "posts/photo_1234567.gif".len());
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("posts/a.tar.gz"), ("posts/a.tar", ".gz"));
        assert_eq!(split_extension("posts/README"), ("posts/README", ""));
        assert_eq!(split_extension("posts/.hidden"), ("posts/.hidden", ""));
    }

    #[tokio::test]
    async fn test_in_memory_put_overwrites() {
        let storage = InMemoryStorage::new();
        storage.put("posts/a.gif", b"one", "image/gif").await.unwrap();
        let stored = storage.put("posts/a.gif", b"two", "image/gif").await.unwrap();

        assert_eq!(stored.size, 3);
        assert_eq!(stored.url, "/media/posts/a.gif");
        assert_eq!(storage.get("posts/a.gif").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("quill-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/media/".to_string());

        let stored = storage
            .put("posts/small.gif", b"GIF89a", "image/gif")
            .await
            .unwrap();
        assert_eq!(stored.url, "/media/posts/small.gif");
        assert!(storage.exists("posts/small.gif").await.unwrap());

        storage.delete("posts/small.gif").await.unwrap();
        assert!(!storage.exists("posts/small.gif").await.unwrap());
        // Deleting twice is fine.
        storage.delete("posts/small.gif").await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
