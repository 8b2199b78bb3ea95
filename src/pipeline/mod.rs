//! Pipeline entry points.
//!
//! - `DeathScraper`: try fetch strategies in order until one yields deaths
//! - `run_pipeline`: scrape, then write the snapshot once

pub mod run;
pub mod scrape;

pub use run::{RunSummary, run_pipeline};
pub use scrape::{Attempt, AttemptOutcome, DeathScraper, ScrapeOutcome};
