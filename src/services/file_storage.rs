use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(usize, usize),

    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Where uploaded files end up
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()>;
}

/// Files under a single directory on the local filesystem
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Flat names only; nothing may escape the upload directory
    fn full_path(&self, name: &str) -> StorageResult<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidPath(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl FileStorage for LocalBackend {
    async fn write(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(name)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }
}

/// An uploaded photo as received from the client
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl PhotoUpload {
    /// Checks type and size, returning the stored name `photo_{id}{ext}`
    pub fn stored_name(&self, bootcamp_id: &str, max_size: usize) -> StorageResult<String> {
        let mime = self.content_type.as_deref().unwrap_or_default();
        if !mime.starts_with("image") {
            return Err(StorageError::InvalidMimeType(mime.to_string()));
        }
        if self.data.len() > max_size {
            return Err(StorageError::FileTooLarge(self.data.len(), max_size));
        }

        let ext = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        Ok(format!("photo_{}{}", bootcamp_id, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(content_type: &str, name: &str, size: usize) -> PhotoUpload {
        PhotoUpload {
            file_name: Some(name.to_string()),
            content_type: Some(content_type.to_string()),
            data: vec![0u8; size],
        }
    }

    #[tokio::test]
    async fn writes_into_root() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path().join("uploads"));

        backend.write("photo_abc.jpg", b"jpeg").await.unwrap();
        assert_eq!(std::fs::read(temp.path().join("uploads/photo_abc.jpg")).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn refuses_path_traversal() {
        let temp = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp.path());
        assert!(matches!(backend.write("../escape.jpg", b"x").await, Err(StorageError::InvalidPath(_))));
        assert!(matches!(backend.write("a/b.jpg", b"x").await, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn photo_name_and_checks() {
        assert_eq!(upload("image/jpeg", "Me.JPG", 10).stored_name("b1", 100).unwrap(), "photo_b1.jpg");
        assert_eq!(upload("image/png", "noext", 10).stored_name("b1", 100).unwrap(), "photo_b1");
        assert!(matches!(
            upload("text/plain", "notes.txt", 10).stored_name("b1", 100),
            Err(StorageError::InvalidMimeType(_))
        ));
        assert!(matches!(
            upload("image/png", "big.png", 101).stored_name("b1", 100),
            Err(StorageError::FileTooLarge(101, 100))
        ));
    }
}
