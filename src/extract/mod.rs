//! Article content extraction
//!
//! This module defines the extraction seam used by the fetch pool:
//! - `Extractor`: given an article URL, produce an [`ArticleRecord`] or fail
//! - `ArticleRecord`: title, body text and open-ended metadata
//! - `HtmlExtractor`: the default implementation (download + HTML heuristics)

mod html;

pub use html::{normalize_date, parse_article, HtmlExtractor};

use crate::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// A successfully extracted article
///
/// Serialises flat: `title`, `text`, then every metadata key at the same level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub text: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ArticleRecord {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry, replacing any previous value for `key`
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The URL the article was extracted from, if recorded
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// Turns an article URL into a structured record
///
/// Implementations do their own downloading and must honour `cancel` by
/// returning promptly once it fires. They are shared across pool workers.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ArticleRecord, ExtractError>;
}
