//! Bounded-concurrency article extraction
//!
//! One pool lives for the whole crawl. Its semaphore caps how many
//! extractions run at once across every batch handed to it; each
//! extraction is a spawned task holding one permit.

use crate::extract::{ArticleRecord, Extractor};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What one batch handed to the pool produced
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful extractions, in completion order
    pub records: Vec<ArticleRecord>,

    /// Extractions actually started; the rest were skipped by cancellation
    pub started: usize,
}

impl BatchReport {
    /// Started extractions that produced no record
    pub fn failed(&self) -> usize {
        self.started - self.records.len()
    }
}

/// Long-lived worker pool for article extraction
pub struct ArticleFetchPool {
    extractor: Arc<dyn Extractor>,
    permits: Arc<Semaphore>,
    num_workers: usize,
}

impl ArticleFetchPool {
    /// Creates a pool running at most `num_workers` extractions at once
    ///
    /// A worker count of zero is raised to one.
    pub fn new(extractor: Arc<dyn Extractor>, num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        Self {
            extractor,
            permits: Arc::new(Semaphore::new(num_workers)),
            num_workers,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Extracts every URL in the batch and returns the successes
    ///
    /// Failed URLs are logged and dropped; they never affect their siblings.
    /// Results arrive in completion order, not input order.
    ///
    /// Once `cancel` fires no further extraction is started. Extractions
    /// already running see the same token and wind down on their own; their
    /// results are still collected.
    pub async fn extract_all(
        &self,
        urls: Vec<String>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = urls.len();
        let mut tasks = JoinSet::new();

        for url in urls {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        "Cancellation requested, {} of {} extractions not started",
                        total - tasks.len(),
                        total
                    );
                    break;
                }
                permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let extractor = Arc::clone(&self.extractor);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = extractor.extract(&url, &cancel).await;
                (url, result)
            });
        }

        let started = tasks.len();
        let mut records = Vec::with_capacity(started);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((url, Ok(record))) => {
                    tracing::debug!("Extracted article: {}", url);
                    records.push(record);
                }
                Ok((url, Err(e))) => {
                    tracing::warn!("Failed to extract article from {}: {}", url, e);
                }
                Err(e) => {
                    tracing::error!("Extraction task failed: {}", e);
                }
            }
        }

        BatchReport { records, started }
    }
}
