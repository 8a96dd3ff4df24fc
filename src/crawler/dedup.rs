//! Run-scoped URL deduplication
//!
//! The search API returns the same article under several pages and days.
//! Each URL is admitted for extraction at most once per run.

use std::collections::HashSet;

/// Set of article URLs already handed to the fetch pool
///
/// Grows monotonically for the lifetime of one crawl and is never persisted.
/// URLs are compared as opaque strings.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` and returns true if it had not been seen before
    pub fn admit(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string())
    }

    /// Keeps only the URLs not seen before, preserving order
    ///
    /// Duplicates within `urls` itself are also dropped.
    pub fn admit_batch(&mut self, urls: Vec<String>) -> Vec<String> {
        urls.into_iter().filter(|url| self.admit(url)).collect()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once_per_url() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit("https://a.test/1"));
        assert!(!dedup.admit("https://a.test/1"));
        assert!(!dedup.admit("https://a.test/1"));
        assert!(dedup.admit("https://a.test/2"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_urls_are_opaque() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.admit("https://a.test/1"));
        // no normalization: these are distinct identifiers
        assert!(dedup.admit("https://a.test/1/"));
        assert!(dedup.admit("https://A.test/1"));
    }

    #[test]
    fn test_admit_batch_filters_seen_and_repeated() {
        let mut dedup = Deduplicator::new();
        dedup.admit("https://a.test/1");

        let admitted = dedup.admit_batch(vec![
            "https://a.test/1".to_string(),
            "https://a.test/2".to_string(),
            "https://a.test/3".to_string(),
            "https://a.test/2".to_string(),
        ]);

        assert_eq!(admitted, vec!["https://a.test/2", "https://a.test/3"]);
        assert!(dedup.contains("https://a.test/3"));
        assert_eq!(dedup.len(), 3);
    }
}
