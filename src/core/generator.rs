use crate::domain::model::{GeneratedReport, ReportDocument, ReportRequest};
use crate::domain::ports::{DocumentRenderer, ObjectStore};
use crate::utils::error::{ReportError, Result};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(432_000);

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub title: String,
    pub object_prefix: String,
    pub url_expiry: Duration,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: crate::core::report::DEFAULT_REPORT_TITLE.to_string(),
            object_prefix: String::new(),
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }
}

/// 組版 → 產生 PDF → 上傳 → 產生下載連結
pub struct ReportService {
    renderer: Arc<dyn DocumentRenderer>,
    store: Arc<dyn ObjectStore>,
    settings: ReportSettings,
}

impl ReportService {
    pub fn new(
        renderer: Arc<dyn DocumentRenderer>,
        store: Arc<dyn ObjectStore>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            renderer,
            store,
            settings,
        }
    }

    /// Renders the report without uploading it.
    pub async fn render(&self, request: &ReportRequest) -> Result<Vec<u8>> {
        let document = ReportDocument::compose(&self.settings.title, request)?;
        tracing::debug!("Composed {} sections", document.sections.len());

        // PDF 產生是 CPU 密集工作，放到 blocking 執行緒
        let renderer = Arc::clone(&self.renderer);
        tokio::task::spawn_blocking(move || renderer.render(&document))
            .await
            .map_err(|e| ReportError::RenderError {
                message: format!("Render task failed: {}", e),
            })?
    }

    pub async fn generate(&self, request: &ReportRequest) -> Result<GeneratedReport> {
        tracing::info!("📝 Generating portfolio optimization report");
        let pdf = self.render(request).await?;
        self.publish(pdf).await
    }

    /// Uploads a rendered PDF under a unique name and returns its download URL.
    pub async fn publish(&self, pdf: Vec<u8>) -> Result<GeneratedReport> {
        let size_bytes = pdf.len();

        let object_key = format!(
            "{}Portfolio_Optimization_Report_{}.pdf",
            self.settings.object_prefix,
            Uuid::new_v4()
        );
        tracing::info!("Generated unique object name: {}", object_key);

        self.store
            .put_object(&object_key, pdf, PDF_CONTENT_TYPE)
            .await?;
        tracing::info!("⬆️ PDF uploaded as '{}' ({} bytes)", object_key, size_bytes);

        let file_url = self
            .store
            .presigned_url(&object_key, self.settings.url_expiry)
            .await?;
        tracing::debug!("Download URL valid for {:?}", self.settings.url_expiry);

        Ok(GeneratedReport {
            object_key,
            file_url,
            size_bytes,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    pub struct MockStore {
        pub files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
        pub fail_uploads: bool,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail_uploads: true,
                ..Self::default()
            }
        }

        pub async fn get_file(&self, key: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(key).map(|(data, _)| data.clone())
        }
    }

    #[async_trait]
    impl ObjectStore for MockStore {
        async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
            if self.fail_uploads {
                return Err(ReportError::StorageError {
                    message: "bucket unavailable".to_string(),
                });
            }
            self.files
                .lock()
                .await
                .insert(key.to_string(), (data, content_type.to_string()));
            Ok(())
        }

        async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
            self.get_file(key).await.ok_or_else(|| {
                ReportError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", key),
                ))
            })
        }

        async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
            Ok(format!(
                "https://mock.example/{}?expires={}",
                key,
                expires_in.as_secs()
            ))
        }
    }
}
