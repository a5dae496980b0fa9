use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use uuid::Uuid;

use super::{StorageBackend, StorageError};

/// Cloudflare R2 through its S3-compatible API.
pub struct R2Storage {
    bucket: Box<Bucket>,
    public_url: String,
}

impl R2Storage {
    pub fn new(
        bucket_name: &str,
        account_id: &str,
        access_key: &str,
        secret_key: &str,
        public_url: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: format!("https://{}.r2.cloudflarestorage.com", account_id),
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::NotConfigured(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::NotConfigured(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for R2Storage {
    async fn upload_to_folder(
        &self,
        folder: &str,
        extension: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let key = format!("{}/{}.{}", folder.trim_matches('/'), Uuid::new_v4(), extension);

        self.bucket
            .put_object_with_content_type(&key, data, content_type)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!("Uploaded {} bytes to R2 key {}", data.len(), key);
        Ok(format!("/{}", key))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.bucket
            .delete_object(path.trim_start_matches('/'))
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.public_url, path)
        }
    }

    fn stored_path(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.public_url.as_str())
            .filter(|path| path.starts_with('/'))
            .map(str::to_string)
    }
}
