//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest page harvester.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{load_config_with_hash, validate, Config};
use sumi_harvest::format::FormatterPool;
use sumi_harvest::output::{
    generate_markdown_summary, print_statistics, write_pages, CrawlSummary, MarkdownPages,
};
use sumi_harvest::{Address, Crawler};
use tracing_subscriber::EnvFilter;

/// Name of the run summary written next to the pages
const SUMMARY_FILE: &str = "summary.md";

/// Sumi-Harvest: a depth-bounded page harvester
///
/// Sumi-Harvest fetches a starting page and the in-scope pages it links to,
/// up to a depth budget, and writes a cleaned copy of every page (optionally
/// converted to Markdown) plus an index of everything it found.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A depth-bounded page harvester", long_about = None)]
struct Cli {
    /// Address to start from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Depth budget (overrides the configuration)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Maximum fetches in flight (overrides the configuration)
    #[arg(long)]
    concurrency: Option<u32>,

    /// Output directory (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Convert cleaned pages to Markdown with the configured formatter
    #[arg(long)]
    markdown: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_effective_config(&cli)?;
    let root = Address::parse(&cli.url).with_context(|| format!("Invalid start address: {}", cli.url))?;

    if cli.dry_run {
        handle_dry_run(&config, &root);
        return Ok(());
    }

    handle_crawl(&config, config_hash, &root, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_fetches = concurrency;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }
    if cli.markdown {
        config.formatter.enabled = true;
    }

    validate(&config).context("Invalid configuration after applying command-line options")?;
    Ok((config, hash))
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, root: &Address) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Start address: {}", root);

    println!("\nCrawler Configuration:");
    println!("  Depth: {}", config.crawler.max_depth);
    println!("  Max concurrent fetches: {}", config.crawler.max_concurrent_fetches);
    println!("  Retry delays: {:?} ms", config.crawler.retry_delays_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Same host only: {}", config.crawler.scope.same_host);
    println!("  Same path prefix only: {}", config.crawler.scope.same_path_prefix);
    for pattern in &config.crawler.scope.allowed_domains {
        println!("  Also allowed: {}", pattern);
    }

    println!("\nRetrieval:");
    println!("  Mode: {:?}", config.retrieval.mode);
    if let Some(proxy) = &config.retrieval.proxy_url {
        println!("  Proxy: {}", proxy);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nFormatter:");
    if config.formatter.enabled {
        println!("  Endpoint: {}", config.formatter.endpoint);
        println!("  Model: {}", config.formatter.model);
        println!("  API key variable: {}", config.formatter.api_key_env);
        println!("  Max concurrent: {}", config.formatter.max_concurrent);
        println!("  Images: {:?}", config.formatter.images);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: Option<String>,
    root: &Address,
    quiet: bool,
) -> anyhow::Result<()> {
    // Built before crawling so a missing API key fails fast
    let formatter = if config.formatter.enabled {
        Some(FormatterPool::from_config(&config.formatter).context("Failed to set up the Markdown formatter")?)
    } else {
        None
    };

    let crawler = Crawler::from_config(config).context("Failed to set up the crawler")?;
    let depth = config.crawler.max_depth;
    let (result, stats) = crawler.crawl_with_stats(root, depth).await;

    if !result.contains(root) {
        bail!("Could not retrieve the start address {}", root);
    }

    let markdown: Option<MarkdownPages> = match &formatter {
        Some(pool) => {
            tracing::info!("Formatting {} pages as Markdown", stats.downloaded);
            Some(pool.format_all(&result).await)
        }
        None => None,
    };

    let dir = Path::new(&config.output.directory);
    write_pages(&result, dir, markdown.as_ref())
        .with_context(|| format!("Failed to write pages to {}", dir.display()))?;

    let mut summary = CrawlSummary::from_crawl(root, depth, &result, &stats);
    if let Some(hash) = config_hash {
        summary = summary.with_config_hash(hash);
    }
    if let Some(pages) = &markdown {
        let failures = pages.values().filter(|r| r.is_err()).count() as u64;
        summary = summary.with_formatting(pages.len() as u64 - failures, failures);
    }

    let summary_path = dir.join(SUMMARY_FILE);
    generate_markdown_summary(&summary, &summary_path)
        .with_context(|| format!("Failed to write summary to {}", summary_path.display()))?;

    if !quiet {
        print_statistics(&stats);
        println!("\n✓ Output written to: {}", dir.display());
    }

    Ok(())
}
