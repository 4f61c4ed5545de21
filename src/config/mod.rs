//! Configuration module for gleaner
//!
//! Loads, parses, and validates TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use gleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Seed URL: {}", config.crawler.seed_url);
//! ```

mod parser;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};

use crate::crawler::RetryPolicy;
use crate::filter::FilterMode;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerSection,

    #[serde(default)]
    pub retry: RetrySection,

    /// Rule set gating which URLs may be followed
    #[serde(rename = "entry-filter", default)]
    pub entry_filter: Option<FilterSection>,

    /// Rule set gating which URLs may be reported
    #[serde(rename = "yield-filter", default)]
    pub yield_filter: Option<FilterSection>,

    /// Present iff resumable state persistence is enabled
    #[serde(default)]
    pub storage: Option<StorageSection>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSection {
    /// The site to crawl; a missing scheme gets `default-scheme` prepended
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum number of expansion levels
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Scheme prepended to schemeless URLs
    #[serde(rename = "default-scheme", default = "default_scheme")]
    pub default_scheme: String,

    /// External identifier for the crawler instance; generated when absent
    #[serde(default)]
    pub identifier: Option<String>,

    /// User-agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Retry policy configuration for transient fetch failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Retries after the first failed attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(rename = "delay-ms", default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetrySection {
    /// Converts this section into the fetcher's retry policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// An allow/deny rule set as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSection {
    pub mode: FilterMode,
    pub patterns: Vec<String>,
}

/// State persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Path to the SQLite state database
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_max_depth() -> u32 {
    10
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_user_agent() -> String {
    concat!("gleaner/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}
