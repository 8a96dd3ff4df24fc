//! HTML article extraction
//!
//! Downloads an article page and pulls out:
//! - The headline (Open Graph / Twitter meta, `<title>`, first `<h1>`)
//! - The body text from the most specific known article container
//! - Metadata: canonical URL, hostname, site name, author, publication date,
//!   description, lead image and document language

use crate::config::{Config, ExtractConfig};
use crate::crawler::{build_http_client, RetryPolicy, RetryingFetcher};
use crate::extract::{ArticleRecord, Extractor};
use crate::{ExtractError, HarvestError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Body containers, most specific first
const BODY_CONTAINERS: &[&str] = &[
    "#dic_area",
    "#newsct_article",
    "[itemprop='articleBody']",
    "article",
    "main",
    "body",
];

/// Elements whose text is never article content
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "button"];

/// Date layouts seen in article metadata, tried after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
];
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d. %H:%M",
    "%Y.%m.%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d.", "%Y.%m.%d", "%Y%m%d", "%Y/%m/%d"];

/// Downloads article pages and extracts their content
pub struct HtmlExtractor {
    fetcher: RetryingFetcher,
    settings: ExtractConfig,
}

impl HtmlExtractor {
    pub fn new(fetcher: RetryingFetcher, settings: ExtractConfig) -> Self {
        Self { fetcher, settings }
    }

    /// Builds an extractor with its own client (article timeout) and the
    /// configured retry budget
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(
            &config.crawler.user_agent,
            Duration::from_secs(config.crawler.article_timeout),
        )?;
        let policy = RetryPolicy::fixed(
            config.crawler.max_trials,
            Duration::from_millis(config.crawler.retry_delay),
        );
        Ok(Self::new(
            RetryingFetcher::new(client, policy),
            config.extract.clone(),
        ))
    }
}

#[async_trait]
impl Extractor for HtmlExtractor {
    async fn extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ArticleRecord, ExtractError> {
        Url::parse(url).map_err(|e| ExtractError::InvalidUrl(format!("{}: {}", url, e)))?;
        let html = self.fetcher.fetch_text(url, cancel).await?;
        parse_article(&html, url, &self.settings)
    }
}

/// Extracts an article record from a downloaded page
///
/// # Arguments
///
/// * `html` - The page source
/// * `url` - The URL the page was requested from
/// * `settings` - Minimum body length and paragraph deduplication
///
/// # Returns
///
/// * `Ok(ArticleRecord)` - Title, body and whatever metadata was present
/// * `Err(ExtractError::NoContent)` - No body text at all
/// * `Err(ExtractError::TooShort)` - Body shorter than `min_text_length`
/// * `Err(ExtractError::WrongLanguage)` - Declared language differs from
///   `target_language`
pub fn parse_article(
    html: &str,
    url: &str,
    settings: &ExtractConfig,
) -> Result<ArticleRecord, ExtractError> {
    let document = Html::parse_document(html);
    let language = document_language(&document);

    if let (Some(expected), Some(found)) = (settings.target_language.as_deref(), &language) {
        if !same_language(found, expected) {
            return Err(ExtractError::WrongLanguage {
                url: url.to_string(),
                found: found.clone(),
                expected: expected.to_string(),
            });
        }
    }

    let paragraphs = extract_paragraphs(&document, settings.deduplicate);
    let text = paragraphs.join("\n");
    let length = text.chars().count();
    if length == 0 {
        return Err(ExtractError::NoContent {
            url: url.to_string(),
        });
    }
    if length < settings.min_text_length {
        return Err(ExtractError::TooShort {
            url: url.to_string(),
            length,
            minimum: settings.min_text_length,
        });
    }

    let title = extract_title(&document).unwrap_or_default();
    let mut record = ArticleRecord::new(title, text).with_meta("source", url);

    let page_url = Url::parse(url).ok();
    let canonical = link_href(&document, "link[rel='canonical'][href]", page_url.as_ref())
        .or_else(|| meta_content(&document, &["og:url"]))
        .unwrap_or_else(|| url.to_string());
    record = record.with_meta("url", canonical);

    if let Some(host) = page_url.as_ref().and_then(|u| u.host_str()) {
        record = record.with_meta("hostname", host);
    }

    let optional = [
        ("sitename", meta_content(&document, &["og:site_name", "application-name"])),
        (
            "author",
            meta_content(&document, &["author", "article:author", "dable:author", "byl"]),
        ),
        ("date", extract_date(&document).map(|raw| normalize_date(&raw))),
        (
            "description",
            meta_content(&document, &["og:description", "description", "twitter:description"]),
        ),
        ("image", meta_content(&document, &["og:image", "twitter:image"])),
        ("language", language),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            record = record.with_meta(key, value);
        }
    }

    Ok(record)
}

/// Extracts the headline from meta tags, `<title>` or the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    meta_content(document, &["og:title", "twitter:title"])
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

/// Body paragraphs from the first container that has any text
fn extract_paragraphs(document: &Html, deduplicate: bool) -> Vec<String> {
    let paragraph_selector = match Selector::parse("p") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    for container in BODY_CONTAINERS {
        let Ok(selector) = Selector::parse(container) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let mut paragraphs: Vec<String> = element
            .select(&paragraph_selector)
            .map(visible_text)
            .filter(|p| !p.is_empty())
            .collect();
        if paragraphs.is_empty() {
            paragraphs = text_blocks(element);
        }
        if paragraphs.is_empty() {
            continue;
        }

        if deduplicate {
            let mut seen = HashSet::new();
            paragraphs.retain(|p| seen.insert(p.clone()));
        }
        return paragraphs;
    }

    Vec::new()
}

/// Every visible text node under `element`, one entry per node
fn text_blocks(element: ElementRef) -> Vec<String> {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if SKIPPED_TAGS.contains(&parent.value().name()) {
                return None;
            }
            let normalized = normalize_whitespace(text);
            (!normalized.is_empty()).then_some(normalized)
        })
        .collect()
}

/// The element's text with script/style content removed, whitespace collapsed
fn visible_text(element: ElementRef) -> String {
    text_blocks(element).join(" ")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

/// First non-empty `content` among `<meta>` tags matching any key, in key order
///
/// Keys are matched against `property`, `name` and `itemprop`.
fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let selector = Selector::parse(&format!(
            "meta[property='{key}'][content], meta[name='{key}'][content], meta[itemprop='{key}'][content]"
        ))
        .ok()?;
        document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(normalize_whitespace)
            .find(|content| !content.is_empty())
    })
}

/// Resolves the `href` of the first element matching `selector`
fn link_href(document: &Html, selector: &str, base: Option<&Url>) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let href = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())?;

    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

/// Raw publication date from meta tags or date-carrying elements
fn extract_date(document: &Html) -> Option<String> {
    meta_content(
        document,
        &[
            "article:published_time",
            "og:article:published_time",
            "datePublished",
            "pubdate",
            "date",
        ],
    )
    .or_else(|| attr_value(document, "[data-date-time]", "data-date-time"))
    .or_else(|| attr_value(document, "time[datetime]", "datetime"))
}

fn attr_value(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Declared document language: `<html lang>`, then `Content-Language`,
/// then `og:locale`
fn document_language(document: &Html) -> Option<String> {
    let declared = document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string);

    declared
        .or_else(|| {
            let selector = Selector::parse("meta[http-equiv][content]").ok()?;
            document
                .select(&selector)
                .find(|meta| {
                    meta.value()
                        .attr("http-equiv")
                        .is_some_and(|v| v.eq_ignore_ascii_case("content-language"))
                })
                .and_then(|meta| meta.value().attr("content"))
                .map(str::trim)
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        })
        .or_else(|| meta_content(document, &["og:locale"]))
}

/// Compares primary language subtags: `ko-KR`, `ko_KR` and `KO` all match `ko`
fn same_language(found: &str, expected: &str) -> bool {
    let primary = |tag: &str| {
        tag.split(|c| c == '-' || c == '_' || c == ',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    };
    primary(found) == primary(expected)
}

/// Normalises a publication date to `YYYY-MM-DD`
///
/// Values that match none of the known layouts are returned trimmed but
/// otherwise unchanged.
///
/// # Examples
///
/// ```
/// use news_harvest::extract::normalize_date;
///
/// assert_eq!(normalize_date("2025-10-01T09:30:00+09:00"), "2025-10-01");
/// assert_eq!(normalize_date("2025.10.01. 오후 3:12"), "2025.10.01. 오후 3:12");
/// ```
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.date_naive().to_string();
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return parsed.date_naive().to_string();
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed.date().to_string();
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return parsed.to_string();
        }
    }

    raw.to_string()
}
