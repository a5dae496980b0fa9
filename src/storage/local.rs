use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use super::{StorageBackend, StorageError};

/// Files under a local directory, served by the app at `/uploads`.
pub struct LocalStorage {
    upload_dir: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(upload_dir: &str, base_url: &str) -> Self {
        Self {
            upload_dir: PathBuf::from(upload_dir),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn upload_to_folder(
        &self,
        folder: &str,
        extension: &str,
        _content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let folder = folder.trim_matches('/');
        let dir = self.upload_dir.join(folder);
        fs::create_dir_all(&dir).await?;

        let unique_name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(dir.join(&unique_name), data).await?;

        Ok(format!("/uploads/{}/{}", folder, unique_name))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let relative = path.trim_start_matches("/uploads/");
        if relative.split('/').any(|part| part == "..") {
            return Err(StorageError::DeleteFailed(format!("Invalid path: {}", path)));
        }

        let file_path = self.upload_dir.join(relative);
        if fs::try_exists(&file_path).await? {
            fs::remove_file(&file_path).await?;
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn stored_path(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.base_url.as_str())
            .filter(|path| path.starts_with("/uploads/"))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_writes_into_folder_and_delete_removes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap(), "http://localhost:3000/");

        let path = storage
            .upload_to_folder("freshom", "png", "image/png", b"png-bytes")
            .await
            .unwrap();
        assert!(path.starts_with("/uploads/freshom/"));
        assert!(path.ends_with(".png"));

        let on_disk = dir.path().join(path.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png-bytes");
        assert_eq!(
            storage.public_url(&path),
            format!("http://localhost:3000{}", path)
        );

        let url = storage.public_url(&path);
        assert_eq!(storage.stored_path(&url), Some(path.clone()));
        assert_eq!(storage.stored_path("https://cdn.example.com/x.png"), None);

        storage.delete(&path).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn delete_refuses_parent_segments() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap(), "");
        assert!(storage.delete("/uploads/../secrets").await.is_err());
    }
}
