//! Fetch strategy descriptors.
//!
//! A strategy names one way of getting the deaths table onto a page: either
//! a URL whose query string already selects the data, or a URL plus a short
//! script of page interactions for data hidden behind client-side controls.
//! Strategies are tried in the order they are declared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single page interaction executed before the markup is captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageAction {
    /// Pause for a fixed duration.
    Wait { milliseconds: u64 },

    /// Click the first element matching `selector`.
    Click { selector: String },

    /// Choose `value` in the `<select>` matching `selector`.
    Select { selector: String, value: String },
}

/// One entry of the ordered fallback list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchStrategy {
    /// Short label used in logs and run summaries
    pub name: String,

    /// Target page
    pub url: String,

    /// Interactions to run before capture; empty for plain URL fetches
    #[serde(default)]
    pub actions: Vec<PageAction>,

    /// Minimum time the page is given to settle before capture
    #[serde(default = "defaults::settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl FetchStrategy {
    /// Plain URL strategy with the default settle delay.
    pub fn url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            actions: Vec::new(),
            settle_delay_ms: defaults::settle_delay_ms(),
            headers: BTreeMap::new(),
        }
    }

    /// Attach an interaction script.
    pub fn with_actions(mut self, actions: Vec<PageAction>) -> Self {
        self.actions = actions;
        self
    }

    /// Whether the strategy needs a fetcher that can drive a page.
    pub fn is_interactive(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Request headers with `User-Agent` filled in when the strategy lacks one.
    pub fn headers_with_user_agent(&self, user_agent: &str) -> BTreeMap<String, String> {
        let mut headers = self.headers.clone();
        let has_agent = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("user-agent"));
        if !has_agent {
            headers.insert("User-Agent".to_string(), user_agent.to_string());
        }
        headers
    }
}

pub(crate) mod defaults {
    use super::{FetchStrategy, PageAction};

    pub fn settle_delay_ms() -> u64 {
        3000
    }

    /// Cheapest first: direct list, world filter by query, world filter via
    /// the dropdown, then the kill statistics page.
    pub fn default_strategies() -> Vec<FetchStrategy> {
        vec![
            FetchStrategy::url(
                "latest-deaths",
                "https://rubinot.com.br/?subtopic=latestdeaths",
            ),
            FetchStrategy::url(
                "latest-deaths-world-query",
                "https://rubinot.com.br/?subtopic=latestdeaths&world=Auroria",
            ),
            FetchStrategy::url(
                "latest-deaths-world-select",
                "https://rubinot.com.br/?subtopic=latestdeaths",
            )
            .with_actions(vec![
                PageAction::Wait { milliseconds: 1000 },
                PageAction::Select {
                    selector: "select[name=\"world\"]".to_string(),
                    value: "Auroria".to_string(),
                },
                PageAction::Click {
                    selector: "input[type=\"submit\"]".to_string(),
                },
                PageAction::Wait { milliseconds: 2000 },
            ]),
            FetchStrategy::url(
                "kill-statistics",
                "https://rubinot.com.br/?subtopic=killstatistics",
            ),
        ]
    }
}
