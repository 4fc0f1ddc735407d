use crate::config::{parse_toml, ReportSection};
use crate::domain::model::ClientProfile;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    pub pipeline: PipelineInfo,
    pub client: ClientProfile,
    pub holdings: HoldingsConfig,
    pub quotes: QuotesConfig,
    pub llm: LlmConfig,
    pub load: LoadConfig,
    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsConfig {
    pub csv_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_symbol_param")]
    pub symbol_param: String,
    #[serde(default = "default_api_key_param")]
    pub api_key_param: String,
    /// JSON pointer to the price, e.g. `/Global Quote/05. price`.
    #[serde(default = "default_price_pointer")]
    pub price_pointer: String,
    /// Fixed query parameters, e.g. `{ function = "GLOBAL_QUOTE" }`.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default = "default_bundle_name")]
    pub bundle_name: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_symbol_param() -> String {
    "symbol".to_string()
}
fn default_api_key_param() -> String {
    "apikey".to_string()
}
fn default_price_pointer() -> String {
    "/price".to_string()
}
fn default_bundle_name() -> String {
    "advisory_bundle.zip".to_string()
}
fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl QuotesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(30))
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts.unwrap_or(2)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms.unwrap_or(500))
    }

    pub fn concurrent_requests(&self) -> usize {
        self.concurrent_requests.unwrap_or(5)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(120))
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.3)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(2048)
    }
}

impl AdvisoryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }
}

impl Validate for AdvisoryConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_non_empty_string("client.name", &self.client.name)?;
        validation::validate_path("holdings.csv_path", &self.holdings.csv_path)?;
        validation::validate_url("quotes.endpoint", &self.quotes.endpoint)?;
        validation::validate_non_empty_string("quotes.price_pointer", &self.quotes.price_pointer)?;
        validation::validate_range(
            "quotes.concurrent_requests",
            self.quotes.concurrent_requests(),
            1,
            50,
        )?;
        if let Some(key) = &self.quotes.api_key {
            validation::validate_no_placeholder("quotes.api_key", key)?;
        }
        validation::validate_url("llm.endpoint", &self.llm.endpoint)?;
        validation::validate_non_empty_string("llm.model", &self.llm.model)?;
        validation::validate_range("llm.temperature", self.llm.temperature(), 0.0, 2.0)?;
        if let Some(key) = &self.llm.api_key {
            validation::validate_no_placeholder("llm.api_key", key)?;
        }
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_url("load.public_base_url", &self.load.public_base_url)?;

        tracing::info!("✅ Advisory configuration validation passed");
        Ok(())
    }
}
