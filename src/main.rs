//! elskip_data CLI application
//!
//! Command-line interface for preparing the electric shipping dashboard data:
//! grid enrichment and indexing, MarU aggregation, validation and summaries.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use elskip_data::cli::{
    handle_aggregate, handle_enrich, handle_index, handle_summary, handle_validate, Cli, Commands,
};
use elskip_data::config::AppConfig;
use elskip_data::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!(category = e.category(), "{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.global.config.as_deref()).await?;
    if let Some(data_dir) = &cli.global.data_dir {
        config.paths.data_root = data_dir.clone();
    }

    init_logging(&cli, &config);
    info!("elskip_data v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command {
        Commands::Enrich(args) => {
            info!("Executing enrich command");
            handle_enrich(&config, args, quiet).await
        }
        Commands::Index => {
            info!("Executing index command");
            handle_index(&config).await
        }
        Commands::Aggregate => {
            info!("Executing aggregate command");
            handle_aggregate(&config).await
        }
        Commands::Validate(args) => {
            info!("Executing validate command");
            handle_validate(&config, args).await
        }
        Commands::Summary => {
            info!("Executing summary command");
            handle_summary(&config).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings and the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let configured = config
        .logging
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);
    let log_level = cli.log_level(configured);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("elskip_data={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
