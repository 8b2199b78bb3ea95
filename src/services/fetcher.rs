//! Page fetcher abstraction.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FetchStrategy, FetcherConfig, PageAction};

/// Per-request options derived from a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Content formats to request, e.g. `html`, `markdown`
    pub formats: Vec<String>,
    /// Minimum settle time before the page is captured
    pub settle_delay_ms: u64,
    pub headers: BTreeMap<String, String>,
    /// Interactions to run before capture
    pub actions: Vec<PageAction>,
}

impl FetchOptions {
    /// Build options for `strategy`, filling defaults from fetcher config.
    pub fn for_strategy(strategy: &FetchStrategy, config: &FetcherConfig) -> Self {
        Self {
            formats: config.formats.clone(),
            settle_delay_ms: strategy.settle_delay_ms,
            headers: strategy.headers_with_user_agent(&config.user_agent),
            actions: strategy.actions.clone(),
        }
    }

    /// Whether a page must be driven before capture.
    pub fn is_interactive(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Content returned by a fetcher.
///
/// Only `html` feeds the parser. `markdown` is logged when `html` is blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: Option<String>,
    pub markdown: Option<String>,
}

impl FetchedPage {
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            markdown: None,
        }
    }

    /// Markup if present and not blank.
    pub fn markup(&self) -> Option<&str> {
        self.html.as_deref().filter(|html| !html.trim().is_empty())
    }
}

/// Something that turns a URL plus options into rendered markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Fetch one page. Errors are per-attempt and recoverable by the caller.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage>;
}
