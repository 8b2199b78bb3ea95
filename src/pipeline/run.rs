// src/pipeline/run.rs

//! One full scrape run: fallback loop, then a single snapshot write.

use chrono::Utc;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::scrape::{Attempt, DeathScraper};
use crate::services::PageFetcher;
use crate::storage::{SnapshotReceipt, SnapshotStorage, write_snapshot};

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// Strategy that produced the records, if any
    pub strategy: Option<String>,
    pub attempts: Vec<Attempt>,
    pub receipt: SnapshotReceipt,
}

/// Run the scraper and persist its snapshot.
///
/// The snapshot is written exactly once, even when every strategy came up
/// empty. Only a storage failure makes the run fail.
pub async fn run_pipeline(
    config: &Config,
    fetcher: &dyn PageFetcher,
    storage: &dyn SnapshotStorage,
) -> Result<RunSummary> {
    let start_time = Utc::now();
    log::info!(
        "Starting death scrape with {} strategies",
        config.strategies.len()
    );

    let scraper = DeathScraper::new(fetcher, &config.fetcher)?;
    let outcome = scraper.scrape(&config.strategies).await;

    let receipt = write_snapshot(storage, &config.slot, &outcome.records).await?;
    log::info!(
        "Saved {} deaths to {} in {}ms",
        receipt.record_count,
        receipt.location,
        (Utc::now() - start_time).num_milliseconds()
    );

    Ok(RunSummary {
        strategy: outcome.winner().map(str::to_string),
        attempts: outcome.attempts,
        receipt,
    })
}
