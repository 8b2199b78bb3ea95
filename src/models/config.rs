//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::FetchStrategy;
use crate::models::strategy::defaults::default_strategies;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage slot the snapshot is written to
    #[serde(default = "defaults::slot")]
    pub slot: String,

    /// Page fetcher settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Ordered fallback list
    #[serde(default = "default_strategies")]
    pub strategies: Vec<FetchStrategy>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults only when the file is missing.
    ///
    /// A file that exists but does not parse is a setup error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config not found at {:?}. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.slot.trim().is_empty() {
            return Err(AppError::validation("slot is empty"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if !self.fetcher.formats.iter().any(|f| f == "html") {
            return Err(AppError::validation(
                "fetcher.formats must include \"html\"",
            ));
        }
        if self.strategies.is_empty() {
            return Err(AppError::validation("No strategies defined"));
        }
        for strategy in &self.strategies {
            let url = Url::parse(&strategy.url).map_err(|e| {
                AppError::validation(format!("strategy '{}': {e}", strategy.name))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "strategy '{}': unsupported scheme {}",
                    strategy.name,
                    url.scheme()
                )));
            }
        }
        if self.fetcher.backend == FetcherBackend::Firecrawl {
            Url::parse(&self.fetcher.api_url)?;
        }
        Ok(())
    }

    /// Read the Firecrawl API key from the environment variable named in config.
    pub fn resolve_api_key(&self) -> Result<String> {
        let var = &self.fetcher.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AppError::config(format!(
                "{var} is not set; required by the firecrawl backend"
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slot: defaults::slot(),
            fetcher: FetcherConfig::default(),
            strategies: default_strategies(),
        }
    }
}

/// Which fetcher implementation drives the strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherBackend {
    /// Rendering service; supports interaction scripts
    Firecrawl,
    /// Plain HTTP GET; interactive strategies fail
    Direct,
}

impl fmt::Display for FetcherBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetcherBackend::Firecrawl => write!(f, "firecrawl"),
            FetcherBackend::Direct => write!(f, "direct"),
        }
    }
}

/// Page fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "defaults::backend")]
    pub backend: FetcherBackend,

    /// Base URL of the Firecrawl API
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "defaults::api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent used when a strategy does not set one
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Content formats requested from the rendering service
    #[serde(default = "defaults::formats")]
    pub formats: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            backend: defaults::backend(),
            api_url: defaults::api_url(),
            api_key_env: defaults::api_key_env(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            formats: defaults::formats(),
        }
    }
}

mod defaults {
    use super::FetcherBackend;

    pub fn slot() -> String {
        "latest_deaths.json".into()
    }

    pub fn backend() -> FetcherBackend {
        FetcherBackend::Firecrawl
    }
    pub fn api_url() -> String {
        "https://api.firecrawl.dev".into()
    }
    pub fn api_key_env() -> String {
        "FIRECRAWL_API_KEY".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; RubinOTBot/1.0)".into()
    }
    pub fn formats() -> Vec<String> {
        vec!["html".into()]
    }
}
