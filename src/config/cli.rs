use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "harvest-report")]
#[command(about = "Portfolio optimization report service")]
pub struct ServeArgs {
    /// Path to TOML configuration file (environment variables are used when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the listen address, e.g. 0.0.0.0:8000
    #[arg(long)]
    pub bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "advisory-run")]
#[command(about = "Run the advisory pipeline: quotes, drafting, report and email bundle")]
pub struct AdvisoryArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "advisory.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Dry run - validate and show the plan without calling any service
    #[arg(long)]
    pub dry_run: bool,
}
