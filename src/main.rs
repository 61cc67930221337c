//! Bald Stalker main entry point
//!
//! Command-line interface: crawl one site into a CSV report, or serve the crawl API.

use anyhow::Context;
use bald_stalker::api::ApiServer;
use bald_stalker::config::{load_config_with_hash, validate, Config};
use bald_stalker::crawler::crawl_with_config;
use bald_stalker::output::{print_statistics, write_csv_report, CrawlStatistics};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Bald Stalker: a bounded, same-domain site crawler
///
/// Crawls every page reachable from URL on the same host, up to MAX_PAGES pages with at
/// most MAX_CONCURRENCY requests in flight, and writes a CSV report.
#[derive(Parser, Debug)]
#[command(name = "bald-stalker")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, same-domain site crawler", long_about = None)]
struct Cli {
    /// Seed URL; only links on its host are followed
    #[arg(value_name = "URL", required_unless_present = "serve")]
    url: Option<String>,

    /// Maximum number of requests in flight
    #[arg(
        value_name = "MAX_CONCURRENCY",
        required_unless_present = "serve",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_concurrency: Option<u32>,

    /// Maximum number of pages to visit
    #[arg(
        value_name = "MAX_PAGES",
        required_unless_present = "serve",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_pages: Option<u32>,

    /// Serve the HTTP crawl API instead of crawling once
    #[arg(long, conflicts_with_all = ["url", "max_concurrency", "max_pages", "output"])]
    serve: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the CSV report (overrides [output] report-path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => return usage_error(&e.to_string()),
    };

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.serve {
        return match ApiServer::new(config).start().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    // clap guarantees all three positionals once --serve is absent
    let (Some(url), Some(max_concurrency), Some(max_pages)) =
        (cli.url, cli.max_concurrency, cli.max_pages)
    else {
        return usage_error("URL, MAX_CONCURRENCY and MAX_PAGES are required");
    };

    config.crawler.max_concurrency = max_concurrency;
    config.crawler.max_pages = max_pages;
    if let Err(e) = validate(&config) {
        return usage_error(&e.to_string());
    }

    let report_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));

    match handle_crawl(&url, &config, &report_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Prints an argument error followed by the usage line
fn usage_error(message: &str) -> ExitCode {
    eprintln!("{}", message.trim_end());
    eprintln!();
    eprintln!("{}", Cli::command().render_usage());
    ExitCode::from(1)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bald_stalker=info,warn"),
            1 => EnvFilter::new("bald_stalker=debug,info"),
            2 => EnvFilter::new("bald_stalker=trace,debug"),
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

/// Loads the configuration file if one was given, defaults otherwise
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the main crawl operation
async fn handle_crawl(url: &str, config: &Config, report_path: &Path) -> anyhow::Result<()> {
    let outcome = crawl_with_config(url, config)
        .await
        .with_context(|| format!("Cannot crawl {}", url))?;

    let rows = write_csv_report(&outcome.pages, report_path)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    if rows > 0 {
        println!("Report written to {}\n", report_path.display());
    }

    print_statistics(&CrawlStatistics::from_outcome(&outcome));
    Ok(())
}
