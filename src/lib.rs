//! news-harvest: a date-windowed news search harvester
//!
//! This crate walks a paginated news search API one calendar day at a time,
//! extracts article content from every result URL with bounded concurrency,
//! and collects a deduplicated list of article records.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;

use thiserror::Error;

/// Main error type for news-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Search page unavailable at {url}: {source}")]
    PageUnavailable { url: String, source: FetchError },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response body from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Gave up on {url} after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        source: Box<FetchError>,
    },

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// Network errors, timeouts, undecodable bodies, HTTP 429 and HTTP 5xx are
    /// transient. Any other status is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Decode { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Exhausted { .. } | Self::Cancelled => false,
        }
    }
}

/// Errors raised by an article extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No article content found at {url}")]
    NoContent { url: String },

    #[error("Article body at {url} too short ({length} < {minimum} chars)")]
    TooShort {
        url: String,
        length: usize,
        minimum: usize,
    },

    #[error("Article at {url} is in '{found}', expected '{expected}'")]
    WrongLanguage {
        url: String,
        found: String,
        expected: String,
    },

    #[error("Invalid article URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for news-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for single-URL fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome, CrawlRequest, DateWindow};
pub use extract::{ArticleRecord, Extractor, HtmlExtractor};
