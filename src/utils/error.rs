use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Archive operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid table in '{section}': {message}")]
    TableError { section: String, message: String },

    #[error("Document rendering failed: {message}")]
    RenderError { message: String },

    #[error("Object storage error: {message}")]
    StorageError { message: String },

    #[error("{service} returned HTTP {status}: {message}")]
    UpstreamError {
        service: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ReportError::ApiError(_) | ReportError::UpstreamError { .. } => ErrorCategory::Network,
            ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::ValidationError { .. }
            | ReportError::TableError { .. } => ErrorCategory::Data,
            ReportError::StorageError { .. } | ReportError::ZipError(_) => ErrorCategory::Storage,
            ReportError::IoError(_) | ReportError::RenderError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 網路錯誤與上游 5xx/429 可以重試
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ReportError::UpstreamError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::ApiError(_) => {
                "Could not reach an external service. Check your network connection.".to_string()
            }
            ReportError::UpstreamError {
                service, status, ..
            } => format!("{} rejected the request (HTTP {})", service, status),
            ReportError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            ReportError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            ReportError::ConfigError { message }
            | ReportError::ConfigValidationError { message, .. } => {
                format!("Configuration problem: {}", message)
            }
            ReportError::TableError { section, message } => {
                format!("A table in '{}' could not be read: {}", section, message)
            }
            ReportError::CsvError(_) => "The holdings file could not be read".to_string(),
            ReportError::StorageError { .. } => "The report could not be stored".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Review the configuration file and environment variables"
            }
            ErrorCategory::Network => "Retry later or verify the endpoint URL and API key",
            ErrorCategory::Data => {
                "Check the input content (tables need a header, a --- separator and at least one row)"
            }
            ErrorCategory::Storage => "Verify bucket permissions or that the output directory is writable",
            ErrorCategory::System => "Inspect the logs for details and retry",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
