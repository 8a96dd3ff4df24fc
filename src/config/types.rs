use serde::Deserialize;

/// Default search endpoint for the news tab "more results" API
pub const DEFAULT_ENDPOINT: &str = "https://s.search.naver.com/p/newssearch/3/api/tab/more";

/// Main configuration structure for news-harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to search for and over which days
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search term, sent percent-encoded
    pub query: String,

    /// First day of the range (inclusive)
    #[serde(rename = "start-date")]
    pub start_date: String,

    /// Last day of the range (inclusive)
    #[serde(rename = "end-date")]
    pub end_date: String,

    /// Base URL of the search API
    pub endpoint: String,

    /// Fixed sort order parameter
    pub sort: u32,

    /// Fixed tab selector (`ssc` parameter)
    pub tab: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            start_date: "2025.10.01".to_string(),
            end_date: "2025.10.21".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sort: 0,
            tab: "tab.news.all".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of article extractions in flight
    #[serde(rename = "num-workers")]
    pub num_workers: u32,

    /// Attempts per URL before giving up
    #[serde(rename = "max-trials")]
    pub max_trials: u32,

    /// Delay between attempts (milliseconds)
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,

    /// Delay after each search page (milliseconds)
    #[serde(rename = "page-delay")]
    pub page_delay: u64,

    /// Timeout for search page requests (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Timeout for article downloads (seconds)
    #[serde(rename = "article-timeout")]
    pub article_timeout: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            max_trials: 3,
            retry_delay: 500,
            page_delay: 500,
            request_timeout: 10,
            article_timeout: 5,
            user_agent: format!("news-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Article content extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Bodies shorter than this many characters are rejected
    #[serde(rename = "min-text-length")]
    pub min_text_length: usize,

    /// Drop paragraphs repeated within one article
    pub deduplicate: bool,

    /// Keep only documents declared in this language (e.g. "ko")
    #[serde(rename = "target-language")]
    pub target_language: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            deduplicate: true,
            target_language: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON array written at the end of the run
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "news.json".to_string(),
        }
    }
}
