//! Local storage for uploaded media.
//!
//! Files are written flat into the upload directory and served back under a
//! public path prefix. Keys are relative paths; anything that would escape the
//! upload directory is treated as missing.

use std::path::{Component, Path, PathBuf};

use crate::{AppError, AppResult};

/// Stored file metadata.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key (relative path inside the upload directory).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`.
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Read a file. Returns `None` if it does not exist or the key is not
    /// a plain relative path.
    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
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

    /// Resolve a key to a path inside the base directory.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty() || key.contains('\\') {
            return None;
        }
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.base_path.join(relative))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self
            .resolve(key)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid storage key: {key}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored uploaded file");

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
        })
    }

    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let Some(path) = self.resolve(key) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            // Directories and other non-files read as missing.
            Err(e) if path.is_dir() => {
                tracing::debug!(key = %key, error = %e, "Refusing to serve directory");
                Ok(None)
            }
            Err(e) => Err(AppError::Internal(format!("Failed to read file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.resolve(key).is_some_and(|path| path.is_file()))
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Storage name for an upload: `{millis}-{sanitized original name}`.
#[must_use]
pub fn upload_file_name(timestamp_millis: i64, original_name: &str) -> String {
    format!("{timestamp_millis}-{}", sanitize_file_name(original_name))
}

/// Content type for a served file, chosen by extension.
#[must_use]
pub fn content_type_for(key: &str) -> &'static str {
    let extension = Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "json" => "application/json",
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my photo (1).JPG"), "my_photo__1_.JPG");
        assert_eq!(sanitize_file_name("clip-01.mp4"), "clip-01.mp4");
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(
            upload_file_name(1_700_000_000_000, "a b.png"),
            "1700000000000-a_b.png"
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("x.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("dir/clip.webm"), "video/webm");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("archive.tar.gz"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/api/static".to_string());

        let stored = storage.upload("1-a.txt", b"hello").await.unwrap();
        assert_eq!(stored.url, "/api/static/1-a.txt");
        assert_eq!(stored.size, 5);

        assert!(storage.exists("1-a.txt").await.unwrap());
        assert_eq!(storage.read("1-a.txt").await.unwrap().unwrap(), b"hello");
        assert!(storage.read("missing.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_storage_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads"), "/api/static".to_string());

        assert!(storage.read("../secret.txt").await.unwrap().is_none());
        assert!(storage.read("/etc/passwd").await.unwrap().is_none());
        assert!(!storage.exists("..").await.unwrap());
        assert!(storage.upload("../x.txt", b"x").await.is_err());
    }
}
