//! Ripple Crawler main entry point
//!
//! Command-line interface: crawls the site described by a crawl file and
//! writes one JSON record per line.

use anyhow::Context;
use clap::Parser;
use ripple_crawler::config::{load_config_with_hash, CrawlFile, ParserEntry};
use ripple_crawler::crawler::{page_record, Crawler, ParserDefinition};
use ripple_crawler::output::{format_statistics, JsonLinesSink, PipelineSink};
use ripple_crawler::url::UrlMatcher;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Ripple Crawler: a domain-restricted crawl engine
///
/// Crawls one site from its seed URLs, runs every page through the declared
/// parsers and writes the extracted records as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawler")]
#[command(version)]
#[command(about = "A domain-restricted crawl engine", long_about = None)]
struct Cli {
    /// Path to the TOML crawl file
    #[arg(value_name = "CRAWL_FILE")]
    crawl_file: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the crawl file and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Write records to this file instead of `[output].path` or stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (file, hash) = load_config_with_hash(&cli.crawl_file)
        .with_context(|| format!("Failed to load {}", cli.crawl_file.display()))?;

    setup_logging(cli.verbose, cli.quiet, &file.crawler.log_level);
    tracing::info!(
        "Loaded crawl file {} (hash: {})",
        cli.crawl_file.display(),
        hash
    );

    let crawler = build_crawler(&file)?;

    if cli.dry_run {
        print_plan(&crawler, &file);
        return Ok(());
    }

    handle_crawl(&crawler, output_path(&cli, &file), cli.quiet).await
}

/// Sets up the logging/tracing subscriber
///
/// `-v`/`-q` take precedence over the crawl file's `log-level`. Logs go to
/// stderr so records can be piped from stdout.
fn setup_logging(verbose: u8, quiet: bool, configured: &str) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new(format!(
                "ripple_crawler={},warn",
                configured.to_ascii_lowercase()
            )),
            1 => EnvFilter::new("ripple_crawler=debug,info"),
            2 => EnvFilter::new("ripple_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn build_crawler(file: &CrawlFile) -> anyhow::Result<Crawler> {
    let mut builder = Crawler::builder().config(file.crawler.clone());

    if let Some(domain) = &file.site.domain {
        builder = builder.domain(domain.clone());
    }
    if !file.site.start_urls.is_empty() {
        builder = builder.start_urls(file.site.start_urls.iter().cloned())?;
    }

    if file.parsers.is_empty() {
        builder = builder.parse(ParserDefinition::new("page", page_record));
    }
    for entry in &file.parsers {
        builder = builder.parse(parser_from_entry(entry)?);
    }

    Ok(builder.build()?)
}

fn parser_from_entry(entry: &ParserEntry) -> anyhow::Result<ParserDefinition> {
    let matcher = match &entry.pattern {
        Some(pattern) => UrlMatcher::regex(pattern)
            .with_context(|| format!("Invalid pattern for parser '{}'", entry.name))?,
        None => UrlMatcher::any(),
    };

    Ok(ParserDefinition::new(entry.name.clone(), page_record)
        .with_priority(entry.priority)
        .with_follow_links(entry.follow_links)
        .with_matcher(matcher))
}

fn output_path(cli: &Cli, file: &CrawlFile) -> Option<PathBuf> {
    cli.output
        .clone()
        .or_else(|| file.output.path.as_ref().map(PathBuf::from))
}

/// Handles the --dry-run mode: shows what would be crawled
fn print_plan(crawler: &Crawler, file: &CrawlFile) {
    let config = crawler.config();

    println!("=== Ripple Crawler Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", crawler.domain());
    println!("  Seeds ({}):", crawler.start_urls().len());
    for seed in crawler.start_urls() {
        println!("    * {}", seed);
    }

    println!("\nCrawler Configuration:");
    println!("  User agent: {}", config.user_agent);
    println!("  Concurrent requests: {}", config.concurrent_requests);
    println!("  Request timeout: {}s", config.request_timeout);
    println!("  Delay: {}s", config.delay);
    println!(
        "  Retries: {} (wait {}s)",
        config.max_retries, config.retry_wait_time
    );
    println!(
        "  Redirects: {}",
        if config.follow_redirects {
            format!("followed (max {})", config.max_redirects)
        } else {
            "not followed".to_string()
        }
    );
    println!("  Respect robots.txt: {}", config.respect_robots_txt);
    match config.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }

    println!("\nParsers ({}):", crawler.parsers().len());
    for parser in crawler.parsers().iter() {
        println!(
            "  - {} (priority {}, {:?}, follow links: {})",
            parser.name(),
            parser.priority(),
            parser.matcher(),
            parser.follows_links()
        );
    }

    println!("\nOutput:");
    match &file.output.path {
        Some(path) => println!("  Records: {}", path),
        None => println!("  Records: stdout"),
    }

    println!("\n✓ Crawl file is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    crawler: &Crawler,
    output: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let writer: Box<dyn Write + Send> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout()),
    };
    let sink: Arc<dyn PipelineSink> = Arc::new(JsonLinesSink::new(writer));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight requests");
            on_interrupt.cancel();
        }
    });

    let stats = match crawler.crawl_until(sink, cancel).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = &output {
        tracing::info!("Records written to {}", path.display());
    }
    if !quiet {
        eprintln!("{}", format_statistics(&stats));
    }

    Ok(())
}
