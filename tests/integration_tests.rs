//! End-to-end tests over the in-process pipeline pieces: fetch (mocked),
//! extract, and the identities that tie the stages together.

use trawler::extractor::ContentExtractor;
use trawler::fetcher::HttpFetcher;
use trawler::models::document_id;
use trawler::urls::{normalize_url, should_crawl_domain};

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new(
        std::time::Duration::from_secs(5),
        1024 * 1024,
        vec!["text/html".to_string(), "application/json".to_string()],
        "TrawlerBot/1.0".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_then_extract_pipeline() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"
        <html lang="en"><head><title>Crawl Target</title></head>
        <body><main>
            <p>Enough prose to clear the main-content threshold: crawling,
            extraction, indexing, and the plumbing between them, repeated
            until this paragraph is comfortably past one hundred characters.</p>
            <a href="/next">Next page</a>
        </main></body></html>
    "#;
    server
        .mock("GET", "/start")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .create_async()
        .await;

    let url = format!("{}/start", server.url());
    let fetched = http_fetcher().fetch(&url).await.unwrap();

    let extracted = ContentExtractor::new()
        .extract(&fetched.body, &fetched.content_type, &url)
        .expect("extraction");

    assert_eq!(extracted.title.as_deref(), Some("Crawl Target"));
    assert!(extracted.content.contains("main-content threshold"));
    assert_eq!(extracted.links.len(), 1);
    assert!(extracted.links[0].url.ends_with("/next"));
}

#[test]
fn test_extracted_links_are_already_normalized() {
    let html = r#"
        <html><body><main>
        <p>Link soup for the normalizer, with enough filler text to make the
        container count as real content for extraction purposes here.</p>
        <a href="/a/?b=2&a=1#frag">Sorted</a>
        <a href="/b/">Trailing</a>
        </main></body></html>
    "#;

    let extracted = ContentExtractor::new()
        .extract(html, "text/html", "https://example.com/page")
        .unwrap();

    let urls: Vec<&str> = extracted.links.iter().map(|l| l.url.as_str()).collect();
    assert!(urls.contains(&"https://example.com/a?a=1&b=2"));
    assert!(urls.contains(&"https://example.com/b"));

    // Re-normalizing an extracted link is a no-op
    for url in urls {
        assert_eq!(normalize_url(url, None).unwrap(), url);
    }
}

#[test]
fn test_document_identity_follows_the_normalized_url() {
    let a = normalize_url("https://example.com/path/#top", None).unwrap();
    let b = normalize_url("https://example.com/path", None).unwrap();

    // Same canonical URL, same document id: re-crawls overwrite
    assert_eq!(document_id(&a), document_id(&b));
}

#[test]
fn test_domain_filter_scenarios() {
    let filter = vec!["example.com".to_string()];
    assert!(should_crawl_domain("https://blog.example.com/x", &filter));
    assert!(!should_crawl_domain("https://evil.com", &filter));
    assert!(!should_crawl_domain("https://notexample.com", &filter));
}
