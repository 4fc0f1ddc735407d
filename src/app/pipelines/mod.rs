pub mod advisory_pipeline;

pub use advisory_pipeline::AdvisoryPipeline;
