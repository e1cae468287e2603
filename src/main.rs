//! Vancian main entry point
//!
//! This is the command-line interface for the Vancian compendium harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vancian::config::load_config_with_hash;
use vancian::crawler::crawl;
use vancian::output::write_records;

/// Vancian: a spell compendium harvester
///
/// Vancian walks a paginated spell catalog, keeps the entries whose source
/// book is on the configured allow-list, fetches each entry's detail page,
/// and prints the parsed records as a single JSON array on stdout.
#[derive(Parser, Debug)]
#[command(name = "vancian")]
#[command(version = "1.0.0")]
#[command(about = "A spell compendium harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    // Run the pipeline; any error here ends the process without output.
    let records = match crawl(config).await {
        Ok(records) => records,
        Err(error) => {
            tracing::error!("Harvest failed: {}", error);
            return Err(error.into());
        }
    };

    let stdout = std::io::stdout();
    write_records(stdout.lock(), &records).context("Failed to write output")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vancian=info,warn"),
            1 => EnvFilter::new("vancian=debug,info"),
            2 => EnvFilter::new("vancian=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be done
fn handle_dry_run(config: &vancian::config::Config) -> anyhow::Result<()> {
    println!("=== Vancian Dry Run ===\n");

    println!("Catalog:");
    println!("  Base URL: {}", config.catalog.base_url);
    println!("  Index: {}", config.index_url()?);

    println!("\nCrawler:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Retry limit: {}", config.crawler.retry_limit);
    println!(
        "  Run mode: {}",
        if config.crawler.headless {
            "headless"
        } else {
            "visible"
        }
    );
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!(
        "\nAllowed origins ({}):",
        config.catalog.allowed_origins.len()
    );
    for origin in &config.catalog.allowed_origins {
        println!("  - {}", origin);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}
