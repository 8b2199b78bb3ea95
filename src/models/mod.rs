// src/models/mod.rs

//! Domain models for the scraper.

mod config;
mod record;
pub(crate) mod strategy;

// Re-export all public types
pub use config::{Config, FetcherBackend, FetcherConfig};
pub use record::{DEFAULT_TIME_LABEL, DeathRecord, record_id};
pub use strategy::{FetchStrategy, PageAction};
