//! Run statistics
//!
//! Counters the coordinator keeps while crawling, printed once at the end
//! of a run. Page and article losses never fail a run, so this is where
//! they become visible.

use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Days in the requested range
    pub windows_total: u64,

    /// Days whose pagination was started
    pub windows_visited: u64,

    /// Days for which the API reported no results at all
    pub windows_without_results: u64,

    /// Search pages successfully fetched
    pub pages_fetched: u64,

    /// Search pages given up on after retries
    pub pages_unavailable: u64,

    /// Article URLs found on search pages, duplicates included
    pub urls_discovered: u64,

    /// Article URLs skipped because they were already seen
    pub duplicates_skipped: u64,

    /// Articles successfully extracted
    pub articles_extracted: u64,

    /// Started extractions that produced no record
    pub articles_dropped: u64,

    /// Admitted article URLs never started because the run was cancelled
    pub articles_not_started: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Whether the run was cut short by a cancellation request
    pub cancelled: bool,
}

impl CrawlStatistics {
    /// Article URLs handed to the extraction pool
    pub fn articles_attempted(&self) -> u64 {
        self.articles_extracted + self.articles_dropped
    }

    /// Returns the extraction success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.articles_attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.articles_extracted as f64 / attempted as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Date windows:");
    println!(
        "  Visited: {} / {}{}",
        stats.windows_visited,
        stats.windows_total,
        if stats.cancelled { " (cancelled)" } else { "" }
    );
    println!("  Without results: {}", stats.windows_without_results);
    println!();

    println!("Search pages:");
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Unavailable: {}", stats.pages_unavailable);
    println!();

    println!("Articles:");
    println!("  URLs discovered: {}", stats.urls_discovered);
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);
    println!("  Extracted: {}", stats.articles_extracted);
    println!("  Dropped: {}", stats.articles_dropped);
    if stats.articles_not_started > 0 {
        println!("  Not started (cancelled): {}", stats.articles_not_started);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} articles extracted) in {:.1}s",
        stats.success_rate(),
        stats.articles_extracted,
        stats.articles_attempted(),
        stats.elapsed.as_secs_f64()
    );
}
