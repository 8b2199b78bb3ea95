// src/services/direct.rs

//! Plain HTTP fetcher.
//!
//! Works for pages whose deaths table is in the server response. It cannot
//! run interaction scripts, so interactive strategies fail here and the
//! orchestrator moves on.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;
use crate::services::fetcher::{FetchOptions, FetchedPage, PageFetcher};
use crate::utils::http::{create_async_client, header_map};

/// Fetcher that issues a single GET per strategy.
pub struct DirectFetcher {
    client: reqwest::Client,
}

impl DirectFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for DirectFetcher {
    fn name(&self) -> &str {
        "direct"
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage> {
        if options.is_interactive() {
            return Err(AppError::fetch(
                url,
                "interaction scripts need a rendering fetcher",
            ));
        }

        let response = self
            .client
            .get(url)
            .headers(header_map(&options.headers)?)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {status}")));
        }

        let html = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(FetchedPage::from_html(html))
    }
}
