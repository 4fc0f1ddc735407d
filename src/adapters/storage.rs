use crate::domain::ports::ObjectStore;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// 本地目錄儲存，檔案經由 `/files` 路由對外提供
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(base_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(ReportError::StorageError {
                message: format!("Refusing object key outside the storage directory: '{}'", key),
            });
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn put_object(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let full_path = self.resolve(key)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ReportError::StorageError {
                    message: format!("Failed to create '{}': {}", parent.display(), e),
                })?;
        }
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| ReportError::StorageError {
                message: format!("Failed to write '{}': {}", full_path.display(), e),
            })?;
        tracing::debug!("Wrote {}", full_path.display());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(key)?;
        Ok(tokio::fs::read(full_path).await?)
    }

    async fn presigned_url(&self, key: &str, _expires_in: Duration) -> Result<String> {
        self.resolve(key)?;
        Ok(format!("{}/files/{}", self.public_base_url, key))
    }
}

#[cfg(feature = "s3")]
pub use s3::S3Storage;

#[cfg(feature = "s3")]
mod s3 {
    use super::*;
    use crate::config::S3Settings;
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::config::{Credentials, Region};
    use aws_sdk_s3::presigning::PresigningConfig;
    use aws_sdk_s3::Client as S3Client;

    /// S3 相容儲存（AWS S3、IBM COS 等），使用 HMAC 憑證
    #[derive(Debug, Clone)]
    pub struct S3Storage {
        client: S3Client,
        bucket: String,
    }

    impl S3Storage {
        pub fn new(client: S3Client, bucket: String) -> Self {
            Self { client, bucket }
        }

        pub async fn from_settings(settings: &S3Settings) -> Result<Self> {
            let base = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let mut builder = aws_sdk_s3::config::Builder::from(&base)
                .region(Region::new(settings.region.clone()))
                .endpoint_url(settings.endpoint.clone())
                .force_path_style(true);

            if let (Some(access), Some(secret)) =
                (&settings.access_key_id, &settings.secret_access_key)
            {
                builder = builder.credentials_provider(Credentials::new(
                    access.clone(),
                    secret.clone(),
                    None,
                    None,
                    "hmac-static",
                ));
            }

            tracing::info!(
                "🪣 Object storage client ready (endpoint: {}, bucket: {})",
                settings.endpoint,
                settings.bucket
            );
            Ok(Self::new(
                S3Client::from_conf(builder.build()),
                settings.bucket.clone(),
            ))
        }
    }

    #[async_trait]
    impl ObjectStore for S3Storage {
        async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(data.into())
                .send()
                .await
                .map_err(|e| ReportError::StorageError {
                    message: format!("Failed to upload '{}': {}", key, e.into_service_error()),
                })?;
            Ok(())
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| ReportError::StorageError {
                    message: format!("Failed to read '{}': {}", key, e.into_service_error()),
                })?;

            let data = resp
                .body
                .collect()
                .await
                .map_err(|e| ReportError::StorageError {
                    message: format!("Failed to collect '{}': {}", key, e),
                })?;
            Ok(data.into_bytes().to_vec())
        }

        async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
            let presigning =
                PresigningConfig::expires_in(expires_in).map_err(|e| ReportError::StorageError {
                    message: format!("Invalid presign expiry: {}", e),
                })?;
            let request = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| ReportError::StorageError {
                    message: format!("Failed to presign '{}': {}", key, e),
                })?;
            Ok(request.uri().to_string())
        }
    }
}
