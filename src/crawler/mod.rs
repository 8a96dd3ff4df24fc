//! Crawler module for search pagination and article harvesting
//!
//! This module contains the core crawling logic, including:
//! - Date range handling and per-day search windows
//! - HTTP fetching with retry logic
//! - Search result pagination and article URL extraction
//! - Run-wide URL deduplication
//! - Bounded-concurrency article extraction
//! - Overall crawl coordination

mod coordinator;
mod dedup;
mod fetcher;
mod paginator;
mod pool;
mod request;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use dedup::Deduplicator;
pub use fetcher::{build_http_client, Backoff, RetryPolicy, RetryingFetcher};
pub use paginator::{
    extract_content_hrefs, CollectionEntry, SearchEndpoint, SearchPageResponse, SearchPaginator,
};
pub use pool::{ArticleFetchPool, BatchReport};
pub use request::{date_windows, parse_date, CrawlRequest, DateWindow, DateWindows};

