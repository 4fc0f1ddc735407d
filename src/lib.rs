pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "s3")]
pub use adapters::storage::S3Storage;
pub use adapters::storage::LocalStorage;

pub use app::pipelines::AdvisoryPipeline;
pub use config::{AdvisoryConfig, ServiceConfig};
pub use core::{engine::AdvisoryEngine, generator::ReportService, pdf::PdfRenderer};
pub use utils::error::{ReportError, Result};
