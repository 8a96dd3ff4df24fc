//! Configuration module for news-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a run can be driven entirely from the command line.
//!
//! # Example
//!
//! ```no_run
//! use news_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Searching for: {}", config.search.query);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, ExtractConfig, OutputConfig, SearchConfig, DEFAULT_ENDPOINT,
};

pub use parser::{compute_config_hash, load_config, parse_config, parse_config_with_hash};
pub use validation::validate;
