//! CLI command definitions for kwforge.
//!
//! Two commands: `extract` runs the full pipeline (catalog, cache, scrape,
//! multi-platform extraction, export) and `crawl` only primes the record
//! cache so a later extract run starts from scraped pages.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::dispatch::{Capability, Coordinator, DispatchConfig, Outcome, Platform};
use crate::export::RunExporter;
use crate::extract::{ExclusionQueue, KeywordResult, PlatformExtractor};
use crate::ingest::{read_catalog, ModelRecord, PageScraper, RecordCache};
use crate::llm::PlatformRegistry;

const DEFAULT_CATALOG: &str = "models.csv";
const DEFAULT_CACHE: &str = "output/models_cache.json";
const DEFAULT_OUTPUT_DIR: &str = "./output";

/// SEO keyword miner for AI model hub pages.
#[derive(Parser)]
#[command(name = "kwforge")]
#[command(about = "Mine SEO keywords from AI model hub pages via concurrent LLM platforms")]
#[command(version)]
#[command(
    long_about = "kwforge reads a model catalog CSV, scrapes each project page for README and \
tags, distributes one keyword-extraction job per model across every LLM platform with an API \
key configured, and exports the aggregated keywords as JSON, Markdown, CSV and a plain list.\n\n\
Example usage:\n  kwforge extract --catalog models.csv --max-models 100 --output ./output"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full pipeline: catalog, scrape, extract, export.
    #[command(alias = "run")]
    Extract(ExtractArgs),

    /// Pre-crawl model pages into the record cache, with resume support.
    Crawl(CrawlArgs),
}

/// Arguments for `kwforge extract`.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Catalog CSV listing the model projects.
    #[arg(short, long, default_value = DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Maximum number of models to process.
    #[arg(short = 'n', long, default_value = "100")]
    pub max_models: usize,

    /// Record cache file, shared with the crawl command.
    #[arg(long, default_value = DEFAULT_CACHE)]
    pub cache: PathBuf,

    /// Directory to create the timestamped run directory in.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Seconds to wait between page fetches.
    #[arg(long, default_value = "0.5")]
    pub delay: f64,

    /// Hub auth token for scraping (can also be set via HUB_TOKEN env var).
    #[arg(long, env = "HUB_TOKEN")]
    pub token: Option<String>,

    /// Per-LLM-call timeout in seconds.
    #[arg(long, default_value = "120")]
    pub call_timeout: u64,

    /// Optional wall-clock budget for the whole batch, in seconds.
    #[arg(long)]
    pub batch_timeout: Option<u64>,

    /// Re-scrape every page even when cached.
    #[arg(long)]
    pub force_crawl: bool,
}

/// Arguments for `kwforge crawl`.
#[derive(Parser, Debug)]
pub struct CrawlArgs {
    /// Catalog CSV listing the model projects.
    #[arg(short, long, default_value = DEFAULT_CATALOG)]
    pub catalog: PathBuf,

    /// Maximum number of models to crawl.
    #[arg(short = 'n', long, default_value = "10000")]
    pub max_models: usize,

    /// Record cache file to populate.
    #[arg(long, default_value = DEFAULT_CACHE)]
    pub cache: PathBuf,

    /// Seconds to wait between page fetches.
    #[arg(long, default_value = "0.5")]
    pub delay: f64,

    /// Hub auth token for scraping (can also be set via HUB_TOKEN env var).
    #[arg(long, env = "HUB_TOKEN")]
    pub token: Option<String>,

    /// Discard the existing cache and re-scrape everything.
    #[arg(long)]
    pub force: bool,
}

/// Parse CLI arguments without executing.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Platform API keys usually live in a local .env
    let _ = dotenvy::dotenv();

    match cli.command {
        Commands::Extract(args) => run_extract_command(args).await?,
        Commands::Crawl(args) => run_crawl_command(args).await?,
    }
    Ok(())
}

// ============================================================================
// Extract Command Implementation
// ============================================================================

async fn run_extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let entries = read_catalog(&args.catalog, args.max_models)?;
    if entries.is_empty() {
        warn!("Catalog has no eligible models, nothing to do");
        return Ok(());
    }

    let bare: Vec<ModelRecord> = entries.into_iter().map(|e| e.into_record()).collect();

    let mut cache = RecordCache::open(&args.cache)?;
    if args.force_crawl {
        info!("Force crawl requested, discarding cached records");
        cache.clear();
    }

    let (resolved, cache_hits) = cache.resolve(bare);
    let records =
        scrape_missing(resolved, &mut cache, args.token.clone(), args.delay).await?;
    info!(
        models = records.len(),
        cache_hits,
        "Records ready for extraction"
    );

    let registry = PlatformRegistry::from_env();
    let exclusion = Arc::new(ExclusionQueue::new());
    let platforms: Vec<Platform<ModelRecord, KeywordResult>> = registry
        .platforms()
        .iter()
        .map(|config| {
            let extractor = PlatformExtractor::new(
                &config.id,
                Arc::new(config.build_client()),
                Arc::clone(&exclusion),
            );
            Platform::new(
                &config.id,
                Arc::new(extractor) as Arc<dyn Capability<ModelRecord, KeywordResult>>,
            )
        })
        .collect();

    let mut config = DispatchConfig::default()
        .with_call_timeout(Duration::from_secs(args.call_timeout));
    if let Some(secs) = args.batch_timeout {
        config = config.with_batch_timeout(Duration::from_secs(secs));
    }

    let report = Coordinator::with_config(platforms, config)
        .run(records)
        .await?;

    let mut results: Vec<KeywordResult> = Vec::new();
    for outcome in &report.outcomes {
        match outcome {
            Outcome::Success { result, .. } => results.push(result.clone()),
            Outcome::Exhausted {
                payload,
                attempted,
                last_error,
                ..
            } => warn!(
                url = %payload.url,
                attempts = attempted.len(),
                error = %last_error,
                "Model failed on every platform"
            ),
            Outcome::Expired { payload, .. } => warn!(
                url = %payload.url,
                "Model did not finish before the batch deadline"
            ),
        }
    }

    if results.is_empty() {
        warn!("No model produced keywords, skipping export");
        return Ok(());
    }

    let exporter = RunExporter::create(&args.output)?;
    let files = exporter.export_all(&results, &report.stats)?;

    info!(
        successes = report.stats.successes,
        exhausted = report.stats.exhausted,
        expired = report.stats.expired,
        success_rate = format!("{:.1}%", report.stats.success_rate() * 100.0),
        results = %files.results_json.display(),
        report = %files.report_md.display(),
        "Extraction run complete"
    );

    Ok(())
}

/// Scrape records that carry no cached content, saving the cache as we go.
async fn scrape_missing(
    records: Vec<ModelRecord>,
    cache: &mut RecordCache,
    token: Option<String>,
    delay_secs: f64,
) -> anyhow::Result<Vec<ModelRecord>> {
    let pending = records.iter().filter(|r| !r.has_content()).count();
    if pending == 0 {
        return Ok(records);
    }

    info!(pending, "Scraping uncached model pages");
    let scraper = PageScraper::new(token);
    let delay = Duration::from_secs_f64(delay_secs.max(0.0));

    let mut out = Vec::with_capacity(records.len());
    let mut scraped = 0usize;
    for record in records {
        if record.has_content() {
            out.push(record);
            continue;
        }

        let fresh = scraper
            .scrape_lossy(&record.url, &record.project_name)
            .await;
        cache.insert(fresh.clone());
        out.push(fresh);

        scraped += 1;
        if scraped % 10 == 0 {
            cache.save()?;
            info!(scraped, pending, "Crawl progress saved");
        }
        if scraped < pending {
            tokio::time::sleep(delay).await;
        }
    }

    cache.save()?;
    Ok(out)
}

// ============================================================================
// Crawl Command Implementation
// ============================================================================

async fn run_crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let entries = read_catalog(&args.catalog, args.max_models)?;
    if entries.is_empty() {
        warn!("Catalog has no eligible models, nothing to crawl");
        return Ok(());
    }

    let mut cache = RecordCache::open(&args.cache)?;
    if args.force {
        info!("Force flag set, discarding cached records");
        cache.clear();
    }

    let total = entries.len();
    let bare: Vec<ModelRecord> = entries
        .into_iter()
        .map(|e| e.into_record())
        .filter(|r| !cache.contains(&r.url))
        .collect();

    info!(
        total,
        cached = total - bare.len(),
        to_crawl = bare.len(),
        "Starting pre-crawl"
    );

    scrape_missing(bare, &mut cache, args.token, args.delay).await?;

    info!(
        cached = cache.len(),
        cache = %cache.path().display(),
        "Pre-crawl complete"
    );
    Ok(())
}
