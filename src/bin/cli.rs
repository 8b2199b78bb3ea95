//! deathlog CLI
//!
//! Local execution entry point. For AWS Lambda, use `deathlog-lambda`.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use deathlog::{
    error::Result,
    models::{Config, FetcherBackend},
    pipeline,
    services::{self, DeathTableParser},
    storage::{LocalStorage, SnapshotStorage, read_snapshot},
};

/// deathlog - latest deaths scraper
#[derive(Parser, Debug)]
#[command(name = "deathlog", version, about = "Scrapes the latest deaths table into a JSON snapshot")]
struct Cli {
    /// Storage directory holding config.toml and snapshots
    #[arg(short, long, default_value = "data")]
    storage_dir: PathBuf,

    /// Config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Try each strategy and write the snapshot
    Run {
        /// Override the configured fetcher backend
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Override the snapshot slot
        #[arg(long)]
        slot: Option<String>,
    },

    /// Validate configuration
    Validate,

    /// Show current snapshot info
    Info {
        /// Slot to inspect (default: configured slot)
        #[arg(long)]
        slot: Option<String>,
    },

    /// Parse a saved HTML page and print the records as JSON
    Parse {
        /// HTML file to parse
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Firecrawl,
    Direct,
}

impl From<Backend> for FetcherBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Firecrawl => FetcherBackend::Firecrawl,
            Backend::Direct => FetcherBackend::Direct,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let mut config = Config::load_or_default(&config_path)?;
    let storage = LocalStorage::new(&cli.storage_dir);

    match cli.command {
        Command::Run { backend, slot } => {
            if let Some(backend) = backend {
                config.fetcher.backend = backend.into();
            }
            if let Some(slot) = slot {
                config.slot = slot;
            }
            config.validate()?;

            let fetcher = services::build_fetcher(&config)?;
            log::info!(
                "Using {} fetcher, storage at {}",
                config.fetcher.backend,
                storage.root().display()
            );

            let summary = pipeline::run_pipeline(&config, fetcher.as_ref(), &storage).await?;

            for attempt in &summary.attempts {
                log::debug!("{} ({}): {:?}", attempt.strategy, attempt.url, attempt.outcome);
            }
            match &summary.strategy {
                Some(name) => log::info!(
                    "Scraping complete. Found {} deaths via '{}'.",
                    summary.receipt.record_count,
                    name
                ),
                None => log::warn!(
                    "Scraping complete. No deaths found after {} attempts.",
                    summary.attempts.len()
                ),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.fetcher.backend == FetcherBackend::Firecrawl {
                config.resolve_api_key()?;
                log::info!("✓ {} is set", config.fetcher.api_key_env);
            }
            log::info!(
                "✓ Config OK ({} strategies, slot '{}')",
                config.strategies.len(),
                config.slot
            );
        }

        Command::Info { slot } => {
            let slot = slot.unwrap_or(config.slot);
            log::info!("Snapshot: {}", storage.location(&slot));

            match read_snapshot(&storage, &slot).await? {
                Some(snapshot) => {
                    log::info!("Last updated: {}", snapshot.last_updated.to_rfc3339());
                    log::info!("Deaths: {}", snapshot.data.len());
                }
                None => log::info!("No snapshot found yet."),
            }
        }

        Command::Parse { file } => {
            let bytes = std::fs::read(&file)?;
            let parser = DeathTableParser::new()?;
            let records = parser.parse_bytes(&bytes, Utc::now())?;

            log::info!("Parsed {} deaths from {}", records.len(), file.display());
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
