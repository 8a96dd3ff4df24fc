//! Output module for harvest results and reports
//!
//! This module handles:
//! - Writing the collected articles as a JSON array
//! - Recording and printing run statistics

mod json;
pub mod stats;

pub use json::write_articles;
pub use stats::{print_statistics, CrawlStatistics};
