//! Programme-Harvest main entry point
//!
//! This is the command-line interface for the resumable degree-programme
//! harvester.

use anyhow::Context;
use clap::Parser;
use programme_harvest::config::{load_config_with_hash, validate, Config};
use programme_harvest::crawler::Coordinator;
use programme_harvest::output::{export_collections, load_statistics, print_statistics, write_summary};
use programme_harvest::url::listing_page_url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Programme-Harvest: a resumable degree-programme scraper
///
/// Programme-Harvest pages through a listing of degree programmes, then
/// fetches every programme page in paced batches. Progress is saved after
/// every page and batch, so re-running the command resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "programme-harvest")]
#[command(version)]
#[command(about = "A resumable degree-programme scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only page through the listing and update the listing file
    #[arg(long, conflicts_with_all = ["details_only", "retry_failures", "stats", "export_summary", "export_sqlite", "dry_run"])]
    discover_only: bool,

    /// Only extract details for already-discovered listings
    #[arg(long, conflicts_with_all = ["discover_only", "retry_failures", "stats", "export_summary", "export_sqlite", "dry_run"])]
    details_only: bool,

    /// Re-queue every URL in the failure file and try it again
    #[arg(long, conflicts_with_all = ["discover_only", "details_only", "stats", "export_summary", "export_sqlite", "dry_run"])]
    retry_failures: bool,

    /// Show statistics from the harvest files and exit
    #[arg(long, conflicts_with_all = ["discover_only", "details_only", "retry_failures", "export_summary", "export_sqlite", "dry_run"])]
    stats: bool,

    /// Generate the markdown summary from existing files and exit
    #[arg(long, conflicts_with_all = ["discover_only", "details_only", "retry_failures", "stats", "export_sqlite", "dry_run"])]
    export_summary: bool,

    /// Export the harvest files to SQLite and exit
    #[arg(long, conflicts_with_all = ["discover_only", "details_only", "retry_failures", "stats", "export_summary", "dry_run"])]
    export_sqlite: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with_all = ["discover_only", "details_only", "retry_failures", "stats", "export_summary", "export_sqlite"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config).context("Built-in configuration is invalid")?;
            (config, None)
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config, config_hash.as_deref())?;
    } else if cli.export_sqlite {
        handle_export_sqlite(&config)?;
    } else if cli.discover_only {
        handle_discover(config).await?;
    } else if cli.details_only {
        handle_details(config, config_hash.as_deref(), false).await?;
    } else if cli.retry_failures {
        handle_details(config, config_hash.as_deref(), true).await?;
    } else {
        handle_harvest(config, config_hash.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("programme_harvest=info,warn"),
            1 => EnvFilter::new("programme_harvest=debug,info"),
            2 => EnvFilter::new("programme_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Programme-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Delay between batches: {}ms", config.crawler.batch_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Discovery failure limit: {}",
        config.crawler.discovery_failure_limit
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nSource:");
    println!("  Base origin: {}", config.source.base_origin);
    println!(
        "  First listing page: {}",
        listing_page_url(&config.source.listing_url, &config.source.page_param, 1)?
    );
    match config.source.last_page {
        Some(last) => println!("  Listing pages: 1..={}", last),
        None => println!("  Listing pages: until the first empty page"),
    }

    println!("\nOutput:");
    println!("  Listings: {}", config.output.listings_path);
    println!("  Programmes: {}", config.output.programmes_path);
    println!("  Failures: {}", config.output.failures_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  SQLite export: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the harvest files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let stats = load_statistics(config).context("Failed to read harvest files")?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config, config_hash: Option<&str>) -> anyhow::Result<()> {
    println!("=== Exporting Harvest Summary ===\n");
    println!("Output: {}", config.output.summary_path);
    println!();

    write_summary(config, config_hash).context("Failed to write summary")?;

    println!("✓ Summary exported to: {}", config.output.summary_path);
    Ok(())
}

/// Handles the --export-sqlite mode
fn handle_export_sqlite(config: &Config) -> anyhow::Result<()> {
    let counts = export_collections(config).context("SQLite export failed")?;

    println!(
        "✓ Exported {} programmes and {} failures to: {}",
        counts.programmes, counts.failures, config.output.database_path
    );
    Ok(())
}

/// Handles the --discover-only mode
async fn handle_discover(config: Config) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(config)?;

    let report = coordinator.discover_listings().await?;
    coordinator.finish()?;

    println!(
        "Discovery finished: {} new listings, {} total ({} pages failed)",
        report.new_listings, report.total_listings, report.pages_failed
    );
    Ok(())
}

/// Handles the --details-only and --retry-failures modes
async fn handle_details(config: Config, config_hash: Option<&str>, retry: bool) -> anyhow::Result<()> {
    let summary_config = config.clone();
    let mut coordinator = Coordinator::new(config)?;

    let report = if retry {
        coordinator.retry_failures().await?
    } else {
        coordinator.extract_details().await?
    };

    print_completion(report.total_successes, report.total_failures, &summary_config);
    write_summary_logged(&summary_config, config_hash);
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: Option<&str>) -> anyhow::Result<()> {
    let summary_config = config.clone();

    match programme_harvest::run_pipeline(config).await {
        Ok((successes, failures)) => {
            print_completion(successes, failures, &summary_config);
            write_summary_logged(&summary_config, config_hash);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_completion(successes: usize, failures: usize, config: &Config) {
    println!("\n{}", "=".repeat(50));
    println!("COMPLETED!");
    println!("Successfully scraped: {}", successes);
    println!("Failed: {}", failures);
    println!("Results saved to: {}", config.output.programmes_path);
    if failures > 0 {
        println!("Failed URLs saved to: {}", config.output.failures_path);
    }
}

/// The summary is a by-product; failing to write it does not fail the run
fn write_summary_logged(config: &Config, config_hash: Option<&str>) {
    if let Err(e) = write_summary(config, config_hash) {
        tracing::warn!("Could not write summary: {}", e);
    }
}
