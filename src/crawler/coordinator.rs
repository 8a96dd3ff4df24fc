//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a harvest, including:
//! - Walking the date range one day at a time, in calendar order
//! - Paginating each day's search results strictly in sequence
//! - Filtering article URLs through the run-wide deduplicator
//! - Handing new URLs to the bounded extraction pool
//! - Pacing requests between pages
//! - Handling cancellation and reporting progress
//!
//! The coordinator is the only owner of the seen-URL set and the collected
//! articles; pool workers hand their records back instead of writing them.

use crate::config::Config;
use crate::crawler::{
    build_http_client, ArticleFetchPool, CrawlRequest, DateWindow, Deduplicator, RetryPolicy,
    RetryingFetcher, SearchEndpoint, SearchPaginator,
};
use crate::extract::{ArticleRecord, Extractor, HtmlExtractor};
use crate::output::CrawlStatistics;
use crate::HarvestError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Everything a finished (or cancelled) run produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Extracted articles in arrival order
    pub articles: Vec<ArticleRecord>,

    /// Counters collected along the way
    pub stats: CrawlStatistics,
}

impl CrawlOutcome {
    pub fn was_cancelled(&self) -> bool {
        self.stats.cancelled
    }
}

/// How a single date window ended
enum WindowEnd {
    Exhausted,
    PageUnavailable,
    Cancelled,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    request: CrawlRequest,
    endpoint: SearchEndpoint,
    fetcher: RetryingFetcher,
    pool: ArticleFetchPool,
    seen: Deduplicator,
    articles: Vec<ArticleRecord>,
    stats: CrawlStatistics,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator using the HTML extractor
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `cancel` - Token that aborts the run when cancelled
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let extractor = Arc::new(HtmlExtractor::from_config(config)?);
        Self::with_extractor(config, extractor, cancel)
    }

    /// Creates a coordinator with a caller-supplied extractor
    pub fn with_extractor(
        config: &Config,
        extractor: Arc<dyn Extractor>,
        cancel: CancellationToken,
    ) -> Result<Self, HarvestError> {
        let request = CrawlRequest::from_config(config)?;
        let endpoint = SearchEndpoint::from_config(&config.search)?;

        let client = build_http_client(
            &config.crawler.user_agent,
            Duration::from_secs(config.crawler.request_timeout),
        )?;
        let fetcher = RetryingFetcher::new(client, RetryPolicy::from_request(&request));
        let pool = ArticleFetchPool::new(extractor, request.num_workers);

        let stats = CrawlStatistics {
            windows_total: request.day_count() as u64,
            ..Default::default()
        };

        Ok(Self {
            request,
            endpoint,
            fetcher,
            pool,
            seen: Deduplicator::new(),
            articles: Vec::new(),
            stats,
            cancel,
        })
    }

    /// Runs the harvest to completion or cancellation
    ///
    /// Unreachable pages and failed articles are logged and counted, never
    /// raised; a cancelled run returns whatever was collected so far.
    pub async fn run(mut self) -> CrawlOutcome {
        let start_time = Instant::now();
        tracing::info!(
            "Harvesting '{}' from {} to {} ({} days, {} workers)",
            self.request.query,
            self.request.start_date,
            self.request.end_date,
            self.request.day_count(),
            self.pool.num_workers()
        );

        for window in self.request.windows() {
            if self.cancel.is_cancelled() {
                break;
            }

            let pages_before = self.stats.pages_fetched;
            let end = self.crawl_window(window).await;
            self.stats.windows_visited += 1;

            tracing::info!(
                "Progress: {} done ({} pages), {}/{} days, {} articles collected",
                window,
                self.stats.pages_fetched - pages_before,
                self.stats.windows_visited,
                self.stats.windows_total,
                self.articles.len()
            );

            if matches!(end, WindowEnd::Cancelled) {
                break;
            }
        }

        self.stats.cancelled = self.cancel.is_cancelled();
        self.stats.elapsed = start_time.elapsed();

        if self.stats.cancelled {
            tracing::warn!(
                "Harvest cancelled after {:?}: returning {} articles collected so far",
                self.stats.elapsed,
                self.articles.len()
            );
        } else {
            tracing::info!(
                "Harvest completed: {} articles from {} pages in {:?}",
                self.articles.len(),
                self.stats.pages_fetched,
                self.stats.elapsed
            );
        }

        CrawlOutcome {
            articles: self.articles,
            stats: self.stats,
        }
    }

    /// Walks every result page of one day
    async fn crawl_window(&mut self, window: DateWindow) -> WindowEnd {
        let mut paginator =
            SearchPaginator::new(&self.fetcher, &self.endpoint, &self.request.query, window);
        let mut counted = 0;
        let mut batches = 0;

        loop {
            let next = paginator.next_batch(&self.cancel).await;
            self.stats.pages_fetched += u64::from(paginator.pages_fetched() - counted);
            counted = paginator.pages_fetched();

            let batch = match next {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(HarvestError::Cancelled) => return WindowEnd::Cancelled,
                Err(HarvestError::PageUnavailable { url, source }) => {
                    self.stats.pages_unavailable += 1;
                    tracing::warn!(
                        "Giving up on {} after unreachable page {}: {}",
                        window,
                        url,
                        source
                    );
                    return WindowEnd::PageUnavailable;
                }
                Err(e) => {
                    tracing::error!("Unexpected error while paginating {}: {}", window, e);
                    return WindowEnd::PageUnavailable;
                }
            };
            batches += 1;

            let discovered = batch.len();
            let new_urls = self.seen.admit_batch(batch);
            let admitted = new_urls.len();
            self.stats.urls_discovered += discovered as u64;
            self.stats.duplicates_skipped += (discovered - admitted) as u64;
            tracing::debug!(
                "{} page {}: {} URLs, {} new",
                window,
                counted,
                discovered,
                admitted
            );

            let report = self.pool.extract_all(new_urls, &self.cancel).await;
            self.stats.articles_extracted += report.records.len() as u64;
            self.stats.articles_dropped += report.failed() as u64;
            self.stats.articles_not_started += (admitted - report.started) as u64;
            self.articles.extend(report.records);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WindowEnd::Cancelled,
                _ = tokio::time::sleep(self.request.page_delay) => {}
            }
        }

        if batches == 0 {
            self.stats.windows_without_results += 1;
            tracing::info!("No articles found for {}", window);
        }
        WindowEnd::Exhausted
    }
}

/// Runs a complete harvest with the HTML extractor
///
/// # Example
///
/// ```no_run
/// use news_harvest::config::load_config;
/// use news_harvest::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let outcome = run_crawl(&config, CancellationToken::new()).await?;
/// println!("{} articles", outcome.articles.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, HarvestError> {
    let coordinator = Coordinator::new(config, cancel)?;
    Ok(coordinator.run().await)
}
