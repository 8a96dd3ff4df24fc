//! HTTP fetcher with bounded retry
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - A retry policy object (attempt budget plus backoff schedule)
//! - GET requests returning text or decoded JSON
//! - Error classification into transient and permanent failures
//! - Cooperative cancellation that cuts retries short

use crate::crawler::CrawlRequest;
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Whole-request timeout applied to every call
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same pause after every failed attempt
    Fixed(Duration),

    /// Doubling pause, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Pause to take after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Bounded retry policy
///
/// | Condition | Action |
/// |-----------|--------|
/// | Network error / timeout | Retry up to `max_trials` |
/// | Undecodable body | Retry up to `max_trials` |
/// | HTTP 429 / 5xx | Retry up to `max_trials` |
/// | Other HTTP status | Immediate failure |
/// | Cancellation | Immediate `FetchError::Cancelled` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_trials: u32,

    /// Pause schedule between attempts
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A policy with a fixed delay between attempts
    pub fn fixed(max_trials: u32, delay: Duration) -> Self {
        Self {
            max_trials,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// The policy described by a crawl request
    pub fn from_request(request: &CrawlRequest) -> Self {
        Self::fixed(request.max_trials, request.retry_delay)
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget runs out
    ///
    /// No pause follows the final attempt. Cancellation is checked before
    /// each attempt and raced against both the attempt and the pause.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - An attempt succeeded
    /// * `Err(FetchError::Exhausted)` - Every attempt failed transiently
    /// * `Err(FetchError::Cancelled)` - Cancellation was requested
    /// * `Err(e)` - A permanent failure, returned as-is
    pub async fn run<T, F, Fut>(
        &self,
        url: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_trials = self.max_trials.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                result = op() => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_trials {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    source: Box::new(error),
                });
            }

            let delay = self.backoff.delay_after(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                max_trials,
                url,
                error,
                delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// GET requests wrapped in a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetches a URL and returns the response body as text
    pub async fn fetch_text(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        self.policy
            .run(url, cancel, move || self.get_text_once(url))
            .await
    }

    /// Fetches a URL and decodes the body as JSON
    ///
    /// A body that fails to decode counts as a transient failure and is
    /// retried like a network error.
    pub async fn fetch_json<T>(&self, url: &str, cancel: &CancellationToken) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        self.policy
            .run(url, cancel, move || async move {
                let body = self.get_text_once(url).await?;
                serde_json::from_str::<T>(&body).map_err(|source| FetchError::Decode {
                    url: url.to_string(),
                    source,
                })
            })
            .await
    }

    /// A single GET attempt
    async fn get_text_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}
