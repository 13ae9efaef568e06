//! profscan - instructor directory resolver
//!
//! Reads a list of instructor names, resolves each against the ratings
//! directory for one institution, and records results in a SQLite ledger.
//! Re-running resumes after the most recently written name.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use profscan::config::{ConfigOverrides, MatchStrategy, ScrapeConfig, APP_NAME, CONFIG_ENV_VAR};
use profscan::db::{Ledger, SqliteLedger};
use profscan::services::{CandidateMatcher, HttpFetcherFactory};
use profscan::workflow::{PipelineSettings, ResolutionPipeline, Scheduler};
use profscan_common::config::{load_toml_config, resolve_config_path, write_toml_config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "profscan", version, about = "Resolve instructor names against a ratings directory")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, env = "PROFSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite ledger path
    #[arg(long, global = true, env = "PROFSCAN_DB")]
    db: Option<PathBuf>,

    /// JSON name list
    #[arg(long, global = true, env = "PROFSCAN_INPUT")]
    input: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long, global = true, env = "PROFSCAN_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Directory institution identifier
    #[arg(long, global = true, env = "PROFSCAN_INSTITUTION_ID")]
    institution_id: Option<u32>,

    /// Required affiliation substring
    #[arg(long, global = true, env = "PROFSCAN_INSTITUTION_NAME")]
    institution_name: Option<String>,

    /// Name matching strategy
    #[arg(long, global = true, value_enum, env = "PROFSCAN_MATCH_STRATEGY")]
    match_strategy: Option<MatchStrategy>,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, env = "PROFSCAN_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve every unprocessed name in the input list (default)
    Run,
    /// Show ledger totals and the resume point
    Status,
    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Destination (defaults to the platform config location)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.db.clone(),
            input_path: self.input.clone(),
            concurrency: self.concurrency,
            institution_id: self.institution_id,
            institution_name: self.institution_name.clone(),
            match_strategy: self.match_strategy,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref(), CONFIG_ENV_VAR, APP_NAME);
    let mut config: ScrapeConfig = load_toml_config(config_path.as_deref())?;
    config.apply_overrides(cli.overrides());

    init_tracing(&config.logging.level)?;
    info!("Starting profscan {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config: {}", path.display());
    }

    config.validate()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Status => status(&config).await,
        Command::InitConfig { path } => init_config(&config, path),
    }
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run(config: &ScrapeConfig) -> Result<()> {
    let names = profscan::input::load_names(&config.input_path)
        .with_context(|| format!("Loading names from {}", config.input_path.display()))?;
    info!("Loaded {} names", names.len());

    let ledger: Arc<dyn Ledger> = Arc::new(open_ledger(&config.database_path).await?);

    let settings = PipelineSettings::from_config(config)?;
    let matcher = CandidateMatcher::from_config(&config.matching);
    info!("Matching policy: {}", matcher.policy_name());

    let pipeline = Arc::new(ResolutionPipeline::new(settings, matcher, Arc::clone(&ledger)));
    let factory = Arc::new(HttpFetcherFactory::new(&config.fetch)?);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight names");
            ctrl_c_token.cancel();
        }
    });

    let scheduler = Scheduler::new(factory, pipeline, ledger, config.concurrency)
        .with_cancellation(cancel);

    let summary = scheduler
        .run(&names, |outcome| println!("{}", outcome))
        .await?;

    info!(
        retried = summary.retried,
        saved = summary.saved(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        cancelled = summary.cancelled(),
        "Run totals"
    );
    println!("All done in {:.2}s", summary.elapsed.as_secs_f64());

    Ok(())
}

async fn status(config: &ScrapeConfig) -> Result<()> {
    let ledger = open_ledger(&config.database_path).await?;
    let summary = ledger.summary().await?;
    let last = ledger.last_processed_name().await?;

    println!("Ledger: {}", config.database_path.display());
    println!("Resolved: {}", summary.resolved);
    println!("Skipped: {}", summary.skipped);
    println!("Awaiting retry: {}", summary.pending);
    println!("Resume after: {}", last.as_deref().unwrap_or("(start)"));

    if let Some((remaining, total)) =
        profscan::input::remaining_count(&config.input_path, last.as_deref())
    {
        println!("Pending: {} of {}", remaining, total);
    }

    Ok(())
}

fn init_config(config: &ScrapeConfig, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => profscan_common::config::default_config_path(APP_NAME)
            .context("No platform config directory; pass --path")?,
    };

    write_toml_config(config, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn open_ledger(path: &Path) -> Result<SqliteLedger> {
    SqliteLedger::open(path)
        .await
        .with_context(|| format!("Opening ledger {}", path.display()))
}
