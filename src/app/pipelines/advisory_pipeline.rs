use crate::adapters::llm::ChatCompletionClient;
use crate::adapters::quotes::HttpQuoteClient;
use crate::adapters::storage::LocalStorage;
use crate::config::AdvisoryConfig;
use crate::core::drafting::{
    attach_report_url, email_prompt, parse_email, parse_report_sections, portfolio_summary_table,
    recommendation_prompt, render_email, report_prompt,
};
use crate::core::generator::{ReportService, ReportSettings, DEFAULT_URL_EXPIRY};
use crate::core::pdf::PdfRenderer;
use crate::domain::model::{
    AdvisoryOutput, Holding, PortfolioSnapshot, PositionSnapshot, RunSummary,
};
use crate::domain::ports::{LanguageModel, ObjectStore, Pipeline};
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use zip::write::{FileOptions, ZipWriter};

/// 持股 → 行情 → 模型撰稿 → 報告 PDF 與信件打包
pub struct AdvisoryPipeline {
    config: AdvisoryConfig,
    quotes: HttpQuoteClient,
    model: Arc<dyn LanguageModel>,
    reports: ReportService,
    output: Arc<dyn ObjectStore>,
    as_of: Option<NaiveDate>,
}

impl AdvisoryPipeline {
    pub fn new(
        config: AdvisoryConfig,
        quotes: HttpQuoteClient,
        model: Arc<dyn LanguageModel>,
        reports: ReportService,
        output: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            quotes,
            model,
            reports,
            output,
            as_of: None,
        }
    }

    /// Wires the HTTP clients and a local output directory from configuration.
    pub fn from_config(config: AdvisoryConfig) -> Result<Self> {
        let quotes = HttpQuoteClient::new(config.quotes.clone())?;
        let model: Arc<dyn LanguageModel> = Arc::new(ChatCompletionClient::new(config.llm.clone())?);
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStorage::new(
            config.load.output_path.clone(),
            config.load.public_base_url.clone(),
        ));
        let reports = ReportService::new(
            Arc::new(PdfRenderer::new()),
            Arc::clone(&store),
            ReportSettings {
                title: config.report.title.clone(),
                object_prefix: "reports/".to_string(),
                url_expiry: DEFAULT_URL_EXPIRY,
            },
        );
        Ok(Self::new(config, quotes, model, reports, store))
    }

    /// Pins the valuation date instead of using today.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    async fn load_holdings(&self) -> Result<Vec<Holding>> {
        let path = &self.config.holdings.csv_path;
        tracing::debug!("Reading holdings from {}", path);
        let data = tokio::fs::read(path).await?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_slice());
        let mut holdings = Vec::new();
        for row in reader.deserialize() {
            let holding: Holding = row?;
            if holding.symbol.is_empty() || holding.shares <= 0.0 || holding.cost_basis < 0.0 {
                return Err(ReportError::ValidationError {
                    message: format!(
                        "Invalid holding '{}': shares must be positive and cost basis non-negative",
                        holding.symbol
                    ),
                });
            }
            holdings.push(holding);
        }

        if holdings.is_empty() {
            return Err(ReportError::ValidationError {
                message: format!("No holdings found in {}", path),
            });
        }
        Ok(holdings)
    }

    fn bundle(&self, output: &AdvisoryOutput, pdf: &[u8], email: &str) -> Result<Vec<u8>> {
        let portfolio_json = serde_json::to_string_pretty(&output.snapshot)?;

        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("report.pdf", FileOptions::default())?;
        zip.write_all(pdf)?;

        zip.start_file::<_, ()>("email.txt", FileOptions::default())?;
        zip.write_all(email.as_bytes())?;

        zip.start_file::<_, ()>("recommendations.md", FileOptions::default())?;
        zip.write_all(output.recommendations.as_bytes())?;

        zip.start_file::<_, ()>("portfolio.json", FileOptions::default())?;
        zip.write_all(portfolio_json.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl Pipeline for AdvisoryPipeline {
    async fn extract(&self) -> Result<PortfolioSnapshot> {
        let holdings = self.load_holdings().await?;

        // 同一檔股票可能分批買進，行情只查一次
        let mut symbols: Vec<String> = Vec::new();
        for h in &holdings {
            if !symbols.contains(&h.symbol) {
                symbols.push(h.symbol.clone());
            }
        }
        tracing::info!("📈 Fetching quotes for {} symbols", symbols.len());
        let prices: HashMap<String, f64> = self
            .quotes
            .fetch_quotes(&symbols)
            .await?
            .into_iter()
            .map(|q| (q.symbol, q.price))
            .collect();

        let as_of = self
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut positions = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let price = prices.get(&holding.symbol).copied().ok_or_else(|| {
                ReportError::ValidationError {
                    message: format!("No quote returned for {}", holding.symbol),
                }
            })?;
            positions.push(PositionSnapshot::new(holding, price, as_of));
        }

        Ok(PortfolioSnapshot::new(as_of, positions))
    }

    async fn transform(&self, snapshot: PortfolioSnapshot) -> Result<AdvisoryOutput> {
        let client = &self.config.client;

        tracing::info!("🤖 Requesting recommendations");
        let (system, user) = recommendation_prompt(client, &snapshot);
        let recommendations = self.model.complete(&system, &user).await?;

        tracing::info!("🤖 Drafting report sections");
        let (system, user) = report_prompt(client, &snapshot, &recommendations);
        let raw_report = self.model.complete(&system, &user).await?;
        let report = parse_report_sections(&raw_report, &portfolio_summary_table(&snapshot))?;

        tracing::info!("🤖 Drafting client email");
        let (system, user) = email_prompt(client, &recommendations);
        let raw_email = self.model.complete(&system, &user).await?;
        let email = parse_email(&raw_email, &client.email);

        Ok(AdvisoryOutput {
            snapshot,
            recommendations,
            report,
            email,
        })
    }

    async fn load(&self, output: AdvisoryOutput) -> Result<RunSummary> {
        let pdf = self.reports.render(&output.report).await?;
        let report = self.reports.publish(pdf.clone()).await?;

        let mut email = output.email.clone();
        attach_report_url(&mut email, &report.file_url);
        let email_text = render_email(&email);

        let zip_data = self.bundle(&output, &pdf, &email_text)?;
        tracing::debug!("Writing bundle ({} bytes) to storage", zip_data.len());
        self.output
            .put_object(&self.config.load.bundle_name, zip_data, "application/zip")
            .await?;

        Ok(RunSummary {
            bundle_path: format!(
                "{}/{}",
                self.config.load.output_path.trim_end_matches('/'),
                self.config.load.bundle_name
            ),
            report_url: report.file_url,
            positions: output.snapshot.positions.len(),
        })
    }
}
