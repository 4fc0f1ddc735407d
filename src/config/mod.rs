#[cfg(feature = "cli")]
pub mod cli;

pub mod advisory;

use crate::core::generator::{ReportSettings, DEFAULT_URL_EXPIRY};
use crate::core::report::DEFAULT_REPORT_TITLE;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub use advisory::AdvisoryConfig;

pub const DEFAULT_API_KEY: &str = "default_key";
pub const DEFAULT_COS_ENDPOINT: &str = "https://s3.us-south.cloud-object-storage.appdomain.cloud";

/// 替換環境變數 (例如 ${API_KEY})；未設定的變數保留原樣
pub fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

pub(crate) fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let processed = substitute_env_vars(content);
    toml::from_str(&processed).map_err(|e| ReportError::ConfigValidationError {
        field: "toml_parsing".to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_files_dir")]
    pub local_dir: String,
    #[serde(default)]
    pub object_prefix: String,
    #[serde(default = "default_url_expiry")]
    pub url_expiry_seconds: u64,
    pub s3: Option<S3Settings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default = "default_cos_endpoint")]
    pub endpoint: String,
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_backend() -> StorageBackend {
    StorageBackend::Local
}
fn default_files_dir() -> String {
    "files".to_string()
}
fn default_url_expiry() -> u64 {
    DEFAULT_URL_EXPIRY.as_secs()
}
fn default_cos_endpoint() -> String {
    DEFAULT_COS_ENDPOINT.to_string()
}
fn default_region() -> String {
    "us-south".to_string()
}
fn default_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_dir: default_files_dir(),
            object_prefix: String::new(),
            url_expiry_seconds: default_url_expiry(),
            s3: None,
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }

    /// 沒有設定檔時，沿用原部署的環境變數
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());

        let backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageBackend::S3,
            Ok("local") | Err(_) => StorageBackend::Local,
            Ok(other) => {
                return Err(ReportError::InvalidConfigValueError {
                    field: "STORAGE_BACKEND".to_string(),
                    value: other.to_string(),
                    reason: "Valid backends: local, s3".to_string(),
                })
            }
        };

        let url_expiry_seconds = match env::var("URL_EXPIRY_SECONDS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ReportError::InvalidConfigValueError {
                    field: "URL_EXPIRY_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: "Must be a whole number of seconds".to_string(),
                })?,
            Err(_) => default_url_expiry(),
        };

        let s3 = match env::var("COS_BUCKET_NAME") {
            Ok(bucket) => Some(S3Settings {
                endpoint: env::var("COS_ENDPOINT").unwrap_or_else(|_| default_cos_endpoint()),
                bucket,
                region: env::var("COS_REGION").unwrap_or_else(|_| default_region()),
                access_key_id: env::var("COS_HMAC_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("COS_HMAC_SECRET_ACCESS_KEY").ok(),
            }),
            Err(_) => None,
        };

        Ok(Self {
            server: ServerSettings {
                bind: env::var("BIND_ADDR").unwrap_or_else(|_| default_bind()),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| default_public_base_url()),
                api_key,
            },
            storage: StorageSettings {
                backend,
                local_dir: env::var("FILES_DIR").unwrap_or_else(|_| default_files_dir()),
                object_prefix: env::var("OBJECT_PREFIX").unwrap_or_default(),
                url_expiry_seconds,
                s3,
            },
            report: ReportSection::default(),
        })
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            title: self.report.title.clone(),
            object_prefix: self.storage.object_prefix.clone(),
            url_expiry: Duration::from_secs(self.storage.url_expiry_seconds),
        }
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;
        validation::validate_url("server.public_base_url", &self.server.public_base_url)?;
        validation::validate_non_empty_string("server.api_key", &self.server.api_key)?;
        validation::validate_no_placeholder("server.api_key", &self.server.api_key)?;
        validation::validate_path("storage.local_dir", &self.storage.local_dir)?;
        // 預簽名連結最長 7 天
        validation::validate_range(
            "storage.url_expiry_seconds",
            self.storage.url_expiry_seconds,
            1,
            604_800,
        )?;

        if self.storage.backend == StorageBackend::S3 {
            let s3 = validation::validate_required_field("storage.s3", &self.storage.s3)?;
            validation::validate_url("storage.s3.endpoint", &s3.endpoint)?;
            validation::validate_no_placeholder("storage.s3.bucket", &s3.bucket)?;
            validation::validate_s3_bucket_name("storage.s3.bucket", &s3.bucket)?;
            validation::validate_region("storage.s3.region", &s3.region)?;
            if s3.access_key_id.is_none() || s3.secret_access_key.is_none() {
                return Err(ReportError::MissingConfigError {
                    field: "storage.s3 HMAC credentials".to_string(),
                });
            }
        }

        tracing::info!("✅ Service configuration validation passed");
        Ok(())
    }
}
