use crate::domain::model::{AdvisoryOutput, PortfolioSnapshot, ReportDocument, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 物件儲存：本地目錄或 S3 相容的 bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
    /// Download URL for `key`, valid for `expires_in` where the backend supports expiry.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String>;
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<PortfolioSnapshot>;
    async fn transform(&self, snapshot: PortfolioSnapshot) -> Result<AdvisoryOutput>;
    async fn load(&self, output: AdvisoryOutput) -> Result<RunSummary>;
}
