//! Search result pagination
//!
//! This module walks the search API for a single date window:
//! - Building the seed page URL (query, sort, day range filter, tab, cursor)
//! - Decoding each page response
//! - Scanning the embedded script blobs for article links
//! - Following the server-provided next-page cursor until it runs dry
//!
//! # State Machine
//!
//! ```text
//! FETCH(url) ──collection null──▶ DONE
//!     │
//!     └──parse + yield batch──▶ next url empty? ──yes──▶ DONE
//!                                     │
//!                                     └──no──▶ FETCH(next url)
//! ```
//!
//! Pagination only moves forward; a page is never fetched twice.

use crate::config::SearchConfig;
use crate::crawler::{DateWindow, RetryingFetcher};
use crate::{ConfigError, FetchError, HarvestError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One page of search results as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPageResponse {
    /// Next page URL; empty, null or absent on the last page
    #[serde(default)]
    pub url: Option<String>,

    /// Rendered result blocks; null when the window has no (more) results
    #[serde(default)]
    pub collection: Option<Vec<CollectionEntry>>,
}

/// A rendered block inside `collection`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionEntry {
    /// Opaque script text carrying the result data
    #[serde(default)]
    pub script: Option<String>,
}

impl SearchPageResponse {
    /// Returns true unless the API reported no results for this page
    pub fn has_results(&self) -> bool {
        self.collection.is_some()
    }

    /// The next-page cursor, if pagination continues
    pub fn next_page(&self) -> Option<&str> {
        let next = self.url.as_deref()?.trim();
        (!next.is_empty()).then_some(next)
    }

    /// Every script blob in the collection
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.collection
            .iter()
            .flatten()
            .filter_map(|entry| entry.script.as_deref())
    }

    /// Article URLs across all script blobs, in page order
    pub fn article_urls(&self) -> Vec<String> {
        self.scripts().flat_map(extract_content_hrefs).collect()
    }
}

static CONTENT_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""contentHref":"(.*?)""#).unwrap());

/// Pulls every `"contentHref":"<url>"` value out of a script blob
///
/// The match is non-greedy: each value ends at the first closing quote.
/// JSON-escaped slashes are unescaped; empty values are skipped. This is
/// tied to how the API currently renders its results.
///
/// # Examples
///
/// ```
/// use news_harvest::crawler::extract_content_hrefs;
///
/// let script = r#"{"contentHref":"https://a.test/1","x":1,"contentHref":"https://a.test/2"}"#;
/// assert_eq!(
///     extract_content_hrefs(script),
///     vec!["https://a.test/1", "https://a.test/2"]
/// );
/// ```
pub fn extract_content_hrefs(script: &str) -> Vec<String> {
    CONTENT_HREF
        .captures_iter(script)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\\/", "/"))
        .filter(|href| !href.is_empty())
        .collect()
}

/// Where and how to query the search API
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    base: Url,
    sort: u32,
    tab: String,
}

impl SearchEndpoint {
    /// An endpoint with the default sort order and tab selector
    pub fn new(base: Url) -> Self {
        let defaults = SearchConfig::default();
        Self {
            base,
            sort: defaults.sort,
            tab: defaults.tab,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;
        Ok(Self {
            base,
            sort: config.sort,
            tab: config.tab.clone(),
        })
    }

    /// URL of the first result page for `query` on `window`
    pub fn first_page(&self, query: &str, window: DateWindow) -> Url {
        let mut url = self.base.clone();
        let params = format!(
            "query={}&sort={}&nso={}&ssc={}&start=1",
            urlencoding::encode(query),
            self.sort,
            urlencoding::encode(&window.range_filter()),
            urlencoding::encode(&self.tab),
        );
        url.set_query(Some(&params));
        url
    }
}

/// Pagination position
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Fetch(Url),
    Done,
}

/// Walks all result pages of one date window
pub struct SearchPaginator<'a> {
    fetcher: &'a RetryingFetcher,
    window: DateWindow,
    cursor: Cursor,
    pages_fetched: u32,
}

impl<'a> SearchPaginator<'a> {
    pub fn new(
        fetcher: &'a RetryingFetcher,
        endpoint: &SearchEndpoint,
        query: &str,
        window: DateWindow,
    ) -> Self {
        Self {
            fetcher,
            window,
            cursor: Cursor::Fetch(endpoint.first_page(query, window)),
            pages_fetched: 0,
        }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_done(&self) -> bool {
        self.cursor == Cursor::Done
    }

    /// Fetches the next page and returns its article URLs
    ///
    /// # Returns
    ///
    /// * `Ok(Some(urls))` - A page with results (the batch may be empty)
    /// * `Ok(None)` - Pagination for this window is over
    /// * `Err(HarvestError::PageUnavailable)` - The page could not be fetched;
    ///   the paginator is finished afterwards
    /// * `Err(HarvestError::Cancelled)` - Cancellation was requested
    pub async fn next_batch(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<String>>, HarvestError> {
        let current = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Fetch(url) => url,
            Cursor::Done => return Ok(None),
        };

        tracing::debug!(
            "Fetching search page {} for {}: {}",
            self.pages_fetched + 1,
            self.window,
            current
        );

        let response: SearchPageResponse =
            match self.fetcher.fetch_json(current.as_str(), cancel).await {
                Ok(response) => response,
                Err(FetchError::Cancelled) => return Err(HarvestError::Cancelled),
                Err(source) => {
                    return Err(HarvestError::PageUnavailable {
                        url: current.to_string(),
                        source,
                    })
                }
            };
        self.pages_fetched += 1;

        if !response.has_results() {
            tracing::debug!("No articles found for {}", current);
            return Ok(None);
        }

        let urls = response.article_urls();

        match response.next_page() {
            None => tracing::debug!("Final page reached for {}", self.window),
            Some(next) => match current.join(next) {
                Ok(next_url) if next_url == current => {
                    tracing::warn!("Search cursor did not advance at {}, stopping", current);
                }
                Ok(next_url) => self.cursor = Cursor::Fetch(next_url),
                Err(e) => {
                    tracing::warn!("Unusable next page URL '{}': {}", next, e);
                }
            },
        }

        Ok(Some(urls))
    }
}
