//! Service layer for the scraper.
//!
//! This module contains the business logic for:
//! - Death table parsing (`DeathTableParser`)
//! - Page fetching (`PageFetcher`, `FirecrawlFetcher`, `DirectFetcher`)

mod direct;
pub mod fetcher;
mod firecrawl;
pub mod parser;

pub use direct::DirectFetcher;
pub use fetcher::{FetchOptions, FetchedPage, PageFetcher};
pub use firecrawl::FirecrawlFetcher;
pub use parser::{DeathTableParser, MAX_RECORDS};

use crate::error::Result;
use crate::models::{Config, FetcherBackend};

/// Build the fetcher selected in config.
///
/// The Firecrawl key is resolved here so a missing key fails setup before
/// any strategy is attempted.
pub fn build_fetcher(config: &Config) -> Result<Box<dyn PageFetcher>> {
    match config.fetcher.backend {
        FetcherBackend::Firecrawl => {
            let api_key = config.resolve_api_key()?;
            Ok(Box::new(FirecrawlFetcher::new(&config.fetcher, api_key)?))
        }
        FetcherBackend::Direct => Ok(Box::new(DirectFetcher::new(&config.fetcher)?)),
    }
}
