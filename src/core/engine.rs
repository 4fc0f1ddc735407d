use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct AdvisoryEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AdvisoryEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("🚀 Starting advisory run");

        // Extract
        let phase = Instant::now();
        let snapshot = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} positions (market value {:.2}) in {:?}",
            snapshot.positions.len(),
            snapshot.total_market_value,
            phase.elapsed()
        );

        // Transform
        let phase = Instant::now();
        let output = self.pipeline.transform(snapshot).await?;
        tracing::info!(
            "✍️ Drafted recommendations, report and email in {:?}",
            phase.elapsed()
        );

        // Load
        let phase = Instant::now();
        let summary = self.pipeline.load(output).await?;
        tracing::info!("📦 Bundle saved to {} in {:?}", summary.bundle_path, phase.elapsed());
        tracing::info!("✅ Advisory run finished in {:?}", started.elapsed());

        Ok(summary)
    }
}
