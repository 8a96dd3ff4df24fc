//! news-harvest main entry point
//!
//! This is the command-line interface for the news-harvest search harvester.

use clap::Parser;
use news_harvest::config::{parse_config_with_hash, validate, Config};
use news_harvest::crawler::run_crawl;
use news_harvest::output::{print_statistics, write_articles};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// news-harvest: a date-windowed news search harvester
///
/// news-harvest walks the news search results for a query one day at a
/// time, extracts every article it finds and writes them all to a single
/// JSON file.
#[derive(Parser, Debug)]
#[command(name = "news-harvest")]
#[command(version)]
#[command(about = "A date-windowed news search harvester", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Search term
    #[arg(long)]
    query: Option<String>,

    /// First day of the range, e.g. 2025.10.01
    #[arg(long)]
    start_date: Option<String>,

    /// Last day of the range (inclusive)
    #[arg(long)]
    end_date: Option<String>,

    /// Maximum number of concurrent article extractions
    #[arg(long)]
    num_workers: Option<u32>,

    /// Attempts per request before giving up
    #[arg(long)]
    max_trials: Option<u32>,

    /// Seconds to wait between retries and between result pages
    #[arg(long)]
    sleep_time: Option<f64>,

    /// Keep only articles declared in this language, e.g. ko
    #[arg(long)]
    target_language: Option<String>,

    /// Where to write the JSON array of articles
    #[arg(long)]
    output_path: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("news_harvest=info,warn"),
            1 => EnvFilter::new("news_harvest=debug,info"),
            2 => EnvFilter::new("news_harvest=trace,debug"),
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

/// Reads the configuration file and logs its fingerprint
fn load_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    tracing::info!("Loading configuration from: {}", path.display());
    match parse_config_with_hash(path) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(cfg)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Command-line flags take precedence over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(query) = &cli.query {
        config.search.query = query.clone();
    }
    if let Some(start) = &cli.start_date {
        config.search.start_date = start.clone();
    }
    if let Some(end) = &cli.end_date {
        config.search.end_date = end.clone();
    }
    if let Some(workers) = cli.num_workers {
        config.crawler.num_workers = workers;
    }
    if let Some(trials) = cli.max_trials {
        config.crawler.max_trials = trials;
    }
    if let Some(seconds) = cli.sleep_time {
        let millis = (seconds.max(0.0) * 1000.0).round() as u64;
        config.crawler.retry_delay = millis;
        config.crawler.page_delay = millis;
    }
    if let Some(language) = &cli.target_language {
        config.extract.target_language = Some(language.clone());
    }
    if let Some(path) = &cli.output_path {
        config.output.path = path.clone();
    }
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            ctrl_c.cancel();
        }
    });

    let outcome = match run_crawl(&config, cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Harvest failed to start: {}", e);
            return Err(e.into());
        }
    };

    let output_path = Path::new(&config.output.path);
    if let Err(e) = write_articles(output_path, &outcome.articles) {
        tracing::error!("Failed to write output: {}", e);
        return Err(e.into());
    }

    print_statistics(&outcome.stats);
    println!("\n✓ {} articles saved to: {}", outcome.articles.len(), output_path.display());

    Ok(())
}
