//! Crawl parameters and date windows
//!
//! A crawl covers an inclusive range of calendar days. Each day is searched
//! on its own, so the range is split into [`DateWindow`]s that the
//! coordinator consumes in calendar order.

use crate::config::Config;
use crate::ConfigError;
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

/// Date formats accepted on the command line and in config files
const DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y-%m-%d", "%Y%m%d"];

/// Parses a calendar date in any of the accepted formats
///
/// # Examples
///
/// ```
/// use news_harvest::crawler::parse_date;
///
/// let a = parse_date("2025.10.01").unwrap();
/// let b = parse_date("20251001").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate, ConfigError> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            ConfigError::InvalidDate(format!(
                "'{}' (expected YYYY.MM.DD, YYYY-MM-DD or YYYYMMDD)",
                input
            ))
        })
}

/// A single calendar day of the crawl range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateWindow(NaiveDate);

impl DateWindow {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The day as `YYYYMMDD`, the form the search API expects
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// The single-day range filter (`nso` parameter, unencoded)
    pub fn range_filter(&self) -> String {
        let day = self.compact();
        format!("so:r,p:from{}to{},a:all", day, day)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Iterator over every day in an inclusive date range
#[derive(Debug, Clone)]
pub struct DateWindows {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateWindows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|day| *day <= self.end)?;
        self.next = current.succ_opt();
        Some(DateWindow(current))
    }
}

/// Splits `[start, end]` into one window per day
///
/// An empty iterator is returned when `start > end`.
pub fn date_windows(start: NaiveDate, end: NaiveDate) -> DateWindows {
    DateWindows {
        next: Some(start),
        end,
    }
}

/// Everything the coordinator needs to know about one run
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Search term (unencoded)
    pub query: String,

    /// First day searched (inclusive)
    pub start_date: NaiveDate,

    /// Last day searched (inclusive)
    pub end_date: NaiveDate,

    /// Maximum concurrent article extractions
    pub num_workers: usize,

    /// Attempts per fetch before giving up
    pub max_trials: u32,

    /// Fixed delay between fetch attempts
    pub retry_delay: Duration,

    /// Pause after each processed search page
    pub page_delay: Duration,
}

impl CrawlRequest {
    /// Creates a request with the default worker, retry and pacing settings
    pub fn new(
        query: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ConfigError> {
        let defaults = crate::config::CrawlerConfig::default();
        let request = Self {
            query: query.into(),
            start_date,
            end_date,
            num_workers: defaults.num_workers as usize,
            max_trials: defaults.max_trials,
            retry_delay: Duration::from_millis(defaults.retry_delay),
            page_delay: Duration::from_millis(defaults.page_delay),
        };
        request.validate()?;
        Ok(request)
    }

    /// Builds the request described by a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let request = Self {
            query: config.search.query.clone(),
            start_date: parse_date(&config.search.start_date)?,
            end_date: parse_date(&config.search.end_date)?,
            num_workers: config.crawler.num_workers as usize,
            max_trials: config.crawler.max_trials,
            retry_delay: Duration::from_millis(config.crawler.retry_delay),
            page_delay: Duration::from_millis(config.crawler.page_delay),
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the request invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::Validation(format!(
                "start_date ({}) must not be after end_date ({})",
                self.start_date, self.end_date
            )));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::Validation(
                "num_workers must be >= 1".to_string(),
            ));
        }
        if self.max_trials == 0 {
            return Err(ConfigError::Validation(
                "max_trials must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The day windows this request covers, in calendar order
    pub fn windows(&self) -> DateWindows {
        date_windows(self.start_date, self.end_date)
    }

    /// Number of days in the range
    pub fn day_count(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }
}
