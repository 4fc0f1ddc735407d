use clap::Parser;
use harvest_report::config::cli::AdvisoryArgs;
use harvest_report::utils::error::ErrorSeverity;
use harvest_report::utils::{logger, validation::Validate};
use harvest_report::{AdvisoryConfig, AdvisoryEngine, AdvisoryPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = AdvisoryArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting advisory run");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match AdvisoryConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No service will be called");
        perform_dry_run(&config);
        return Ok(());
    }

    let pipeline = match AdvisoryPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    let engine = AdvisoryEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Advisory run completed successfully!");
            println!("✅ Advisory run completed successfully!");
            println!("📦 Bundle saved to: {}", summary.bundle_path);
            println!("📄 Report: {}", summary.report_url);
            println!("📊 Positions analysed: {}", summary.positions);
        }
        Err(e) => {
            tracing::error!(
                "❌ Advisory run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 依錯誤嚴重程度決定退出碼
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
    }

    Ok(())
}

fn display_config_summary(config: &AdvisoryConfig, args: &AdvisoryArgs) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    println!("  Client: {} <{}>", config.client.name, config.client.email);
    println!("  Holdings: {}", config.holdings.csv_path);
    println!("  Quotes: {}", config.quotes.endpoint);
    println!("  Model: {} @ {}", config.llm.model, config.llm.endpoint);
    println!(
        "  Output: {}/{}",
        config.load.output_path, config.load.bundle_name
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &AdvisoryConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("👤 Client Profile:");
    println!("  Risk tolerance: {}", config.client.risk_tolerance);
    println!("  Goals: {}", config.client.goals);
    if !config.client.sector_preferences.is_empty() {
        println!(
            "  Sector preferences: {}",
            config.client.sector_preferences.join(", ")
        );
    }

    println!();
    println!("📡 Quote Source:");
    println!("  Endpoint: {}", config.quotes.endpoint);
    println!("  Price field: {}", config.quotes.price_pointer);
    println!(
        "  Retries: {} (delay {:?}), concurrency {}",
        config.quotes.retry_attempts(),
        config.quotes.retry_delay(),
        config.quotes.concurrent_requests()
    );

    println!();
    println!("🤖 Drafting:");
    println!(
        "  Three model calls: recommendations, report sections, client email (temperature {}, max tokens {})",
        config.llm.temperature(),
        config.llm.max_tokens()
    );

    println!();
    println!("💾 Bundle contents: report.pdf, email.txt, recommendations.md, portfolio.json");
    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
