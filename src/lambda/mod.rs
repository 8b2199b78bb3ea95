// src/lambda/mod.rs

//! AWS Lambda handler for the scraper.
//!
//! Each invocation performs one run:
//! 1. Builds config from defaults plus environment overrides
//! 2. Tries the fetch strategies in order
//! 3. Writes the snapshot to S3

use lambda_runtime::{Error as LambdaError, LambdaEvent};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::models::{Config, FetcherBackend};
use crate::pipeline::run_pipeline;
use crate::services::build_fetcher;
use crate::storage::S3Storage;

/// Lambda invocation payload.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    /// Snapshot slot override
    #[serde(default)]
    pub slot: Option<String>,

    /// Fetcher backend override
    #[serde(default)]
    pub backend: Option<FetcherBackend>,
}

/// Lambda response payload for a run whose snapshot was written.
#[derive(Debug, Default, Serialize)]
pub struct ScrapeResponse {
    /// Number of deaths in the snapshot
    pub record_count: usize,

    /// Strategy that produced the records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Where the snapshot was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

/// Main Lambda handler function.
///
/// Setup and storage failures fail the invocation.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<ScrapeRequest>,
) -> std::result::Result<ScrapeResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!(
        "Starting scrape: slot={:?}, backend={:?}",
        request.slot, request.backend
    );

    match run_scrape(&request).await {
        Ok(mut response) => {
            response.execution_time_ms = start.elapsed().as_millis() as u64;
            info!(
                "Scrape completed: {} deaths in {}ms",
                response.record_count, response.execution_time_ms
            );
            Ok(response)
        }
        Err(e) => {
            error!(
                "Scrape failed after {}ms: {}",
                start.elapsed().as_millis(),
                e
            );
            Err(LambdaError::from(e))
        }
    }
}

/// Internal scrape logic.
async fn run_scrape(request: &ScrapeRequest) -> Result<ScrapeResponse> {
    let mut config = load_lambda_config();
    if let Some(slot) = &request.slot {
        config.slot = slot.clone();
    }
    if let Some(backend) = request.backend {
        config.fetcher.backend = backend;
    }
    config.validate()?;

    let storage = S3Storage::from_env().await?;
    let fetcher = build_fetcher(&config)?;

    let summary = run_pipeline(&config, fetcher.as_ref(), &storage).await?;

    Ok(ScrapeResponse {
        record_count: summary.receipt.record_count,
        strategy: summary.strategy,
        location: Some(summary.receipt.location),
        execution_time_ms: 0,
    })
}

/// Load configuration suitable for Lambda environment.
fn load_lambda_config() -> Config {
    let mut config = Config::default();

    if let Ok(slot) = std::env::var("SNAPSHOT_SLOT") {
        config.slot = slot;
    }

    if let Ok(backend) = std::env::var("FETCHER_BACKEND") {
        match backend.to_lowercase().as_str() {
            "direct" => config.fetcher.backend = FetcherBackend::Direct,
            "firecrawl" => config.fetcher.backend = FetcherBackend::Firecrawl,
            other => warn!("Ignoring unknown FETCHER_BACKEND '{}'", other),
        }
    }

    if let Ok(timeout) = std::env::var("FETCH_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse() {
            config.fetcher.timeout_secs = secs;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_request_defaults() {
        let json = r#"{}"#;
        let req: ScrapeRequest = serde_json::from_str(json).unwrap();
        assert!(req.slot.is_none());
        assert!(req.backend.is_none());
    }

    #[test]
    fn test_scrape_request_with_options() {
        let json = r#"{"slot": "deaths/auroria.json", "backend": "direct"}"#;
        let req: ScrapeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.slot.as_deref(), Some("deaths/auroria.json"));
        assert_eq!(req.backend, Some(FetcherBackend::Direct));
    }

    #[test]
    fn test_response_omits_missing_strategy() {
        let response = ScrapeResponse {
            record_count: 0,
            location: Some("s3://bucket/deathlog/latest_deaths.json".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["record_count"], 0);
        assert!(json.get("strategy").is_none());
        assert_eq!(json["location"], "s3://bucket/deathlog/latest_deaths.json");
    }

    #[tokio::test]
    async fn test_setup_failure_fails_invocation() {
        let request = ScrapeRequest {
            slot: Some("   ".to_string()),
            backend: Some(FetcherBackend::Direct),
        };
        let event = LambdaEvent::new(request, lambda_runtime::Context::default());

        let result = handler(event).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("slot is empty"));
    }
}
