// src/pipeline/scrape.rs

//! Strategy fallback loop.
//!
//! Strategies are fetched one at a time in declared order. The first one
//! whose markup parses to at least one record wins and the rest are never
//! fetched. Fetch errors, blank markup and empty tables all just move on to
//! the next strategy.

use chrono::Utc;

use crate::error::Result;
use crate::models::{DeathRecord, FetchStrategy, FetcherConfig};
use crate::services::{DeathTableParser, FetchOptions, PageFetcher};

/// What happened when one strategy was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The fetcher returned an error
    FetchFailed(String),
    /// The fetch succeeded without usable markup
    EmptyMarkup,
    /// Markup parsed to zero records
    NoRecords,
    /// Markup parsed to this many records
    Success(usize),
}

/// One entry of the attempt log.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub strategy: String,
    pub url: String,
    pub outcome: AttemptOutcome,
}

/// Result of running the fallback loop.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    /// Records from the winning strategy, empty if none won
    pub records: Vec<DeathRecord>,
    pub attempts: Vec<Attempt>,
}

impl ScrapeOutcome {
    /// Name of the strategy that produced the records.
    pub fn winner(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Success(_)))
            .map(|a| a.strategy.as_str())
    }

    /// Number of attempts whose fetch failed.
    pub fn fetch_failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::FetchFailed(_)))
            .count()
    }
}

/// Drives fetcher and parser over an ordered strategy list.
pub struct DeathScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    fetcher_config: &'a FetcherConfig,
    parser: DeathTableParser,
}

impl<'a> DeathScraper<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, fetcher_config: &'a FetcherConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            fetcher_config,
            parser: DeathTableParser::new()?,
        })
    }

    /// Try each strategy until one yields records.
    pub async fn scrape(&self, strategies: &[FetchStrategy]) -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::default();

        for (index, strategy) in strategies.iter().enumerate() {
            log::info!(
                "[{}/{}] Trying {} strategy '{}' via {}: {}",
                index + 1,
                strategies.len(),
                if strategy.is_interactive() { "interactive" } else { "static" },
                strategy.name,
                self.fetcher.name(),
                strategy.url
            );

            let (result, records) = self.attempt(strategy).await;
            outcome.attempts.push(Attempt {
                strategy: strategy.name.clone(),
                url: strategy.url.clone(),
                outcome: result,
            });

            if !records.is_empty() {
                log::info!(
                    "Strategy '{}' found {} deaths",
                    strategy.name,
                    records.len()
                );
                outcome.records = records;
                return outcome;
            }
        }

        log::warn!(
            "All {} strategies exhausted without records ({} fetch failures)",
            strategies.len(),
            outcome.fetch_failures()
        );
        outcome
    }

    async fn attempt(&self, strategy: &FetchStrategy) -> (AttemptOutcome, Vec<DeathRecord>) {
        let options = FetchOptions::for_strategy(strategy, self.fetcher_config);

        let page = match self.fetcher.fetch(&strategy.url, &options).await {
            Ok(page) => page,
            Err(error) => {
                log::warn!("Failed to fetch strategy '{}': {}", strategy.name, error);
                return (AttemptOutcome::FetchFailed(error.to_string()), Vec::new());
            }
        };

        let Some(html) = page.markup() else {
            log::warn!("Strategy '{}' returned no markup", strategy.name);
            if let Some(markdown) = page.markdown.as_deref() {
                log::debug!(
                    "Strategy '{}' markdown ({} bytes): {}",
                    strategy.name,
                    markdown.len(),
                    markdown.chars().take(200).collect::<String>()
                );
            }
            return (AttemptOutcome::EmptyMarkup, Vec::new());
        };

        let records = self.parser.parse(html, Utc::now());
        if records.is_empty() {
            log::info!("Strategy '{}' markup had no death rows", strategy.name);
            (AttemptOutcome::NoRecords, records)
        } else {
            (AttemptOutcome::Success(records.len()), records)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted fetcher: each URL maps to a canned response.
    pub(crate) struct ScriptedFetcher {
        responses: HashMap<String, std::result::Result<FetchedPage, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
            self.responses
                .insert(url.to_string(), Ok(FetchedPage::from_html(html)));
            self
        }

        pub(crate) fn empty(mut self, url: &str) -> Self {
            self.responses
                .insert(url.to_string(), Ok(FetchedPage::default()));
            self
        }

        pub(crate) fn markdown_only(mut self, url: &str, markdown: &str) -> Self {
            let page = FetchedPage {
                html: None,
                markdown: Some(markdown.to_string()),
            };
            self.responses.insert(url.to_string(), Ok(page));
            self
        }

        pub(crate) fn failure(mut self, url: &str, message: &str) -> Self {
            self.responses
                .insert(url.to_string(), Err(message.to_string()));
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<FetchedPage> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(message)) => Err(AppError::fetch(url, message)),
                None => Err(AppError::fetch(url, "unexpected url")),
            }
        }
    }

    pub(crate) fn deaths_html(players: &[&str]) -> String {
        let rows: String = players
            .iter()
            .map(|p| format!("<tr><td>{p}</td><td>150</td><td>a dragon</td></tr>"))
            .collect();
        format!("<table><tr><th>Name</th><th>Level</th><th>Killer</th></tr>{rows}</table>")
    }

    fn strategies(names: &[&str]) -> Vec<FetchStrategy> {
        names
            .iter()
            .map(|n| FetchStrategy::url(*n, format!("https://game.example/{n}")))
            .collect()
    }

    #[tokio::test]
    async fn test_stops_after_first_success() {
        let fetcher = ScriptedFetcher::new()
            .failure("https://game.example/a", "timeout")
            .page(
                "https://game.example/b",
                &deaths_html(&["Alpha", "Bravo", "Charlie"]),
            )
            .page("https://game.example/c", &deaths_html(&["Delta"]));
        let config = FetcherConfig::default();
        let scraper = DeathScraper::new(&fetcher, &config).unwrap();

        let outcome = scraper.scrape(&strategies(&["a", "b", "c"])).await;

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.winner(), Some("b"));
        assert_eq!(outcome.fetch_failures(), 1);
        assert_eq!(
            fetcher.calls(),
            vec!["https://game.example/a", "https://game.example/b"]
        );
        assert!(matches!(
            outcome.attempts[0].outcome,
            AttemptOutcome::FetchFailed(_)
        ));
        assert_eq!(outcome.attempts[1].outcome, AttemptOutcome::Success(3));
    }

    #[tokio::test]
    async fn test_empty_markup_and_empty_tables_fall_through() {
        let fetcher = ScriptedFetcher::new()
            .empty("https://game.example/a")
            .page("https://game.example/b", "<p>maintenance</p>")
            .page("https://game.example/c", &deaths_html(&["Echo Rider"]));
        let config = FetcherConfig::default();
        let scraper = DeathScraper::new(&fetcher, &config).unwrap();

        let outcome = scraper.scrape(&strategies(&["a", "b", "c"])).await;

        let results: Vec<AttemptOutcome> =
            outcome.attempts.iter().map(|a| a.outcome.clone()).collect();
        assert_eq!(
            results,
            vec![
                AttemptOutcome::EmptyMarkup,
                AttemptOutcome::NoRecords,
                AttemptOutcome::Success(1),
            ]
        );
        assert_eq!(outcome.records[0].player, "Echo Rider");
    }

    #[tokio::test]
    async fn test_all_exhausted_is_empty_not_error() {
        let fetcher = ScriptedFetcher::new()
            .failure("https://game.example/a", "dns")
            .page("https://game.example/b", &deaths_html(&[]));
        let config = FetcherConfig::default();
        let scraper = DeathScraper::new(&fetcher, &config).unwrap();

        let outcome = scraper.scrape(&strategies(&["a", "b"])).await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.winner(), None);
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.fetch_failures(), 1);
    }

    #[tokio::test]
    async fn test_markdown_without_html_counts_as_empty_markup() {
        let fetcher = ScriptedFetcher::new()
            .markdown_only("https://game.example/a", "| Name | Level |")
            .page("https://game.example/b", &deaths_html(&["Foxtrot"]));
        let config = FetcherConfig::default();
        let scraper = DeathScraper::new(&fetcher, &config).unwrap();

        let outcome = scraper.scrape(&strategies(&["a", "b"])).await;

        assert_eq!(outcome.attempts[0].outcome, AttemptOutcome::EmptyMarkup);
        assert_eq!(outcome.winner(), Some("b"));
        assert_eq!(outcome.fetch_failures(), 0);
    }

    #[tokio::test]
    async fn test_no_strategies_no_fetches() {
        let fetcher = ScriptedFetcher::new();
        let config = FetcherConfig::default();
        let scraper = DeathScraper::new(&fetcher, &config).unwrap();

        let outcome = scraper.scrape(&[]).await;
        assert!(outcome.records.is_empty());
        assert!(fetcher.calls().is_empty());
    }
}
