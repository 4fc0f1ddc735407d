pub mod drafting;
pub mod engine;
pub mod generator;
pub mod layout;
pub mod markdown;
pub mod pdf;
pub mod report;

pub use crate::domain::model::{ReportDocument, ReportRequest};
pub use crate::domain::ports::{DocumentRenderer, ObjectStore, Pipeline};
pub use crate::utils::error::Result;
