use clap::Parser;
use harvest_report::config::cli::ServeArgs;
use harvest_report::config::{ServiceConfig, StorageBackend};
use harvest_report::domain::ports::ObjectStore;
use harvest_report::server::{create_router, AppState};
use harvest_report::utils::error::{ErrorSeverity, ReportError};
use harvest_report::utils::{logger, validation::Validate};
use harvest_report::{LocalStorage, PdfRenderer, ReportService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServeArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting harvest-report service v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = serve(args).await {
        tracing::error!(
            "❌ Service failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), ReportError> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            ServiceConfig::from_file(path)?
        }
        None => {
            tracing::info!("📁 No config file given, reading environment variables");
            ServiceConfig::from_env()?
        }
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    config.validate()?;
    if config.server.api_key == harvest_report::config::DEFAULT_API_KEY {
        tracing::warn!("⚠️ Running with the default API key; set API_KEY before exposing the service");
    }
    if args.verbose {
        tracing::debug!(
            "Storage: {:?}, prefix '{}', URL expiry {}s",
            config.storage.backend,
            config.storage.object_prefix,
            config.storage.url_expiry_seconds
        );
    }

    let store = build_store(&config).await?;
    let reports = ReportService::new(Arc::new(PdfRenderer::new()), store, config.report_settings());
    let state = AppState::new(reports, &config.server.api_key, &config.storage.local_dir);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("🌐 Listening on {}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &ServiceConfig) -> Result<Arc<dyn ObjectStore>, ReportError> {
    match config.storage.backend {
        StorageBackend::Local => {
            tokio::fs::create_dir_all(&config.storage.local_dir).await?;
            tracing::info!("💾 Storing reports under {}", config.storage.local_dir);
            Ok(Arc::new(LocalStorage::new(
                &config.storage.local_dir,
                &config.server.public_base_url,
            )))
        }
        #[cfg(feature = "s3")]
        StorageBackend::S3 => {
            let settings = config
                .storage
                .s3
                .as_ref()
                .ok_or_else(|| ReportError::MissingConfigError {
                    field: "storage.s3".to_string(),
                })?;
            Ok(Arc::new(
                harvest_report::S3Storage::from_settings(settings).await?,
            ))
        }
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(ReportError::InvalidConfigValueError {
            field: "storage.backend".to_string(),
            value: "s3".to_string(),
            reason: "This build was compiled without the 's3' feature".to_string(),
        }),
    }
}
