use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Where uploaded images end up. Returned paths are backend-relative; `public_url`
/// turns them into links browsers can load.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upload_to_folder(
        &self,
        folder: &str,
        extension: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
    fn public_url(&self, path: &str) -> String;
    /// Inverse of `public_url` for links this backend handed out; `None` for foreign URLs.
    fn stored_path(&self, url: &str) -> Option<String>;
}
