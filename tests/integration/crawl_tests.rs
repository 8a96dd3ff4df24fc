//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the search API (and, for the
//! end-to-end case, the article sites) and drive the full crawl cycle
//! through the coordinator.

use async_trait::async_trait;
use news_harvest::config::Config;
use news_harvest::crawler::Coordinator;
use news_harvest::extract::{ArticleRecord, Extractor};
use news_harvest::output::write_articles;
use news_harvest::ExtractError;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/api/tab/more";

/// Creates a fast test configuration pointing at the mock search API
fn create_test_config(server: &MockServer, start: &str, end: &str) -> Config {
    let mut config = Config::default();
    config.search.query = "강원대".to_string();
    config.search.start_date = start.to_string();
    config.search.end_date = end.to_string();
    config.search.endpoint = format!("{}{}", server.uri(), SEARCH_PATH);
    config.crawler.num_workers = 2;
    config.crawler.max_trials = 2;
    config.crawler.retry_delay = 10;
    config.crawler.page_delay = 10;
    config
}

fn day_filter(compact: &str) -> String {
    format!("so:r,p:from{}to{},a:all", compact, compact)
}

/// A search page body carrying the given article URLs
fn search_page(next: &str, urls: &[&str]) -> serde_json::Value {
    let script: String = urls
        .iter()
        .map(|u| format!(r#"{{"contentHref":"{}","type":"news"}}"#, u.replace('/', "\\/")))
        .collect::<Vec<_>>()
        .join(",");
    json!({ "url": next, "collection": [{ "script": format!("[{}]", script) }] })
}

/// Extractor that records every URL it is asked for
#[derive(Default)]
struct RecordingExtractor {
    calls: AtomicUsize,
    cancel_on_call: Option<CancellationToken>,
}

#[async_trait]
impl Extractor for RecordingExtractor {
    async fn extract(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<ArticleRecord, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        Ok(ArticleRecord::new(format!("title of {}", url), "body").with_meta("source", url))
    }
}

fn sources(articles: &[ArticleRecord]) -> HashSet<String> {
    articles
        .iter()
        .filter_map(|a| a.source().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_two_pages_with_duplicate_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "1"))
        .and(query_param("nso", day_filter("20251001").as_str()))
        .and(query_param("query", "강원대"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            "?start=11",
            &["https://n.test/a", "https://n.test/b"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            "",
            &["https://n.test/c", "https://n.test/a"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.01");
    let extractor = Arc::new(RecordingExtractor::default());
    let coordinator =
        Coordinator::with_extractor(&config, extractor.clone(), CancellationToken::new())
            .expect("coordinator");

    let outcome = coordinator.run().await;

    assert!(!outcome.was_cancelled());
    assert_eq!(outcome.articles.len(), 3);
    let expected: HashSet<String> = ["https://n.test/a", "https://n.test/b", "https://n.test/c"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(sources(&outcome.articles), expected);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);

    let stats = &outcome.stats;
    assert_eq!(stats.windows_visited, 1);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.urls_discovered, 4);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.articles_extracted, 3);
    assert_eq!(stats.articles_dropped, 0);
}

#[tokio::test]
async fn test_unavailable_page_skips_only_that_day() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("nso", day_filter("20251001").as_str()))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("nso", day_filter("20251002").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_page("", &["https://n.test/day2"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.02");
    let extractor = Arc::new(RecordingExtractor::default());
    let outcome = Coordinator::with_extractor(&config, extractor, CancellationToken::new())
        .expect("coordinator")
        .run()
        .await;

    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.articles[0].source(), Some("https://n.test/day2"));
    assert_eq!(outcome.stats.windows_visited, 2);
    assert_eq!(outcome.stats.pages_unavailable, 1);
    assert_eq!(outcome.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_failed_second_page_keeps_first_page_articles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            "?start=11",
            &["https://n.test/p1a", "https://n.test/p1b"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "11"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.01");
    let extractor = Arc::new(RecordingExtractor::default());
    let outcome = Coordinator::with_extractor(&config, extractor, CancellationToken::new())
        .expect("coordinator")
        .run()
        .await;

    assert!(!outcome.was_cancelled());
    let expected: HashSet<String> = ["https://n.test/p1a", "https://n.test/p1b"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(sources(&outcome.articles), expected);
    assert_eq!(outcome.stats.pages_fetched, 1);
    assert_eq!(outcome.stats.pages_unavailable, 1);
    assert_eq!(outcome.stats.windows_without_results, 0);
}

#[tokio::test]
async fn test_null_cursor_page_is_harvested() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": null,
            "collection": [{ "script": r#""contentHref":"https://n.test/only""# }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.01");
    let extractor = Arc::new(RecordingExtractor::default());
    let outcome = Coordinator::with_extractor(&config, extractor, CancellationToken::new())
        .expect("coordinator")
        .run()
        .await;

    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.articles[0].source(), Some("https://n.test/only"));
    assert_eq!(outcome.stats.pages_unavailable, 0);
}

#[tokio::test]
async fn test_null_collection_ends_the_day() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "url": "?start=11", "collection": null })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.01");
    let extractor = Arc::new(RecordingExtractor::default());
    let outcome = Coordinator::with_extractor(&config, extractor.clone(), CancellationToken::new())
        .expect("coordinator")
        .run()
        .await;

    assert!(outcome.articles.is_empty());
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.stats.pages_fetched, 1);
    assert_eq!(outcome.stats.windows_without_results, 1);
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "1"))
        .and(query_param("nso", day_filter("20251001").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            "?start=11",
            &["https://n.test/1", "https://n.test/2", "https://n.test/3"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    // neither the next page nor the next day may be requested
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("start", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page("", &[])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("nso", day_filter("20251002").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page("", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, "2025.10.01", "2025.10.02");
    config.crawler.num_workers = 1;

    let cancel = CancellationToken::new();
    let extractor = Arc::new(RecordingExtractor {
        calls: AtomicUsize::new(0),
        cancel_on_call: Some(cancel.clone()),
    });
    let outcome = Coordinator::with_extractor(&config, extractor.clone(), cancel)
        .expect("coordinator")
        .run()
        .await;

    assert!(outcome.was_cancelled());
    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.stats.windows_visited, 1);
    assert_eq!(outcome.stats.articles_dropped, 0);
    assert_eq!(outcome.stats.articles_not_started, 2);
    assert_eq!(outcome.stats.success_rate(), 100.0);
}

#[tokio::test]
async fn test_html_extraction_end_to_end() {
    let server = MockServer::start().await;
    let good = format!("{}/article/1", server.uri());
    let missing = format!("{}/article/2", server.uri());

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_page("", &[&good, &missing])),
        )
        .mount(&server)
        .await;

    let html = r#"<html lang="ko"><head>
        <meta property="og:title" content="도서관 개관">
        <meta property="article:published_time" content="2025-10-01T09:30:00+09:00">
        </head><body><article id="dic_area">
        <p>강원대학교가 새 도서관을 열었다. 학생들은 밤늦게까지 이용할 수 있다.</p>
        <p>The new library stays open late and adds two hundred study seats.</p>
        </article></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/article/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/article/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "2025.10.01", "2025.10.01");
    let outcome = Coordinator::new(&config, CancellationToken::new())
        .expect("coordinator")
        .run()
        .await;

    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.stats.articles_dropped, 1);

    let article = &outcome.articles[0];
    assert_eq!(article.title, "도서관 개관");
    assert!(article.text.contains("새 도서관"));
    assert!(article.text.contains("two hundred study seats"));
    assert_eq!(article.source(), Some(good.as_str()));

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("news.json");
    write_articles(&out, &outcome.articles).unwrap();
    let written: Vec<ArticleRecord> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, outcome.articles);
}
