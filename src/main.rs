//! bookgraph main entry point
//!
//! This is the command-line interface for the bookgraph crawler.

use anyhow::Context;
use bookgraph::config::{load_config_with_hash, validate, Config};
use bookgraph::crawler::run_crawl;
use bookgraph::output::print_report;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// bookgraph: a resumable crawler for a social-reading site
///
/// Starting from a seed user, bookgraph walks the user → books → reviewers
/// graph breadth-first and stores profiles, read lists and book metadata in
/// SQLite. Interrupted crawls resume from the visited-set snapshots.
#[derive(Parser, Debug)]
#[command(name = "bookgraph")]
#[command(version)]
#[command(about = "A resumable social-reading graph crawler", long_about = None)]
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

    /// Start from this user instead of the configured seed
    #[arg(long, value_name = "ID")]
    seed: Option<String>,

    /// Discard visited-set snapshots before starting
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the run parameters without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(seed) = cli.seed {
        config.crawler.seed_user = seed;
        validate(&config).context("Invalid --seed")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookgraph=info,warn"),
            1 => EnvFilter::new("bookgraph=debug,info"),
            2 => EnvFilter::new("bookgraph=trace,debug"),
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

/// Handles the --dry-run mode: prints the resolved run parameters
fn handle_dry_run(config: &Config) {
    println!("=== bookgraph Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed user: {}", config.crawler.seed_user);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Reviewers per book: {}", config.crawler.reviewers_per_book);
    match config.crawler.max_interaction_pages {
        Some(pages) => println!("  Read-list pages per user: {}", pages),
        None => println!("  Read-list pages per user: unlimited"),
    }

    println!("\nPoliteness:");
    println!(
        "  Request delay: {}-{}ms",
        config.politeness.min_delay_ms, config.politeness.max_delay_ms
    );
    println!(
        "  Book delay: {}-{}ms",
        config.politeness.book_delay_min_ms, config.politeness.book_delay_max_ms
    );
    println!("  Request timeout: {}s", config.politeness.request_timeout_secs);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  State directory: {}", config.output.state_dir);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use bookgraph::output::{load_statistics, print_statistics};
    use bookgraph::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, Path::new(&config.output.state_dir))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (discarding visited snapshots)");
    } else {
        tracing::info!("Starting crawl (visited snapshots are honored)");
    }

    tracing::info!(
        "Seed user {}, max depth {}, {} reviewers per book",
        config.crawler.seed_user,
        config.crawler.max_depth,
        config.crawler.reviewers_per_book
    );

    match run_crawl(config, config_hash, fresh).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
