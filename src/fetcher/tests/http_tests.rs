use crate::fetcher::{FetchError, HttpFetcher};
use std::time::Duration;

fn fetcher(max_size: usize) -> HttpFetcher {
    HttpFetcher::new(
        Duration::from_secs(5),
        max_size,
        vec![
            "text/html".to_string(),
            "text/plain".to_string(),
            "application/pdf".to_string(),
            "application/json".to_string(),
        ],
        "TrawlerBot/1.0".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_successful_html_fetch() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_header("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT")
        .with_body("<html><body>hello</body></html>")
        .create_async()
        .await;

    let page = fetcher(1024 * 1024)
        .fetch(&format!("{}/page", server.url()))
        .await
        .unwrap();

    assert_eq!(page.status_code, 200);
    assert_eq!(page.content_type, "text/html");
    assert!(page.body.contains("hello"));
    assert!(page.last_modified.is_some());
    assert!(!page.rendered);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unsupported_mime_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/image")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![0u8; 16])
        .create_async()
        .await;

    let err = fetcher(1024)
        .fetch(&format!("{}/image", server.url()))
        .await
        .unwrap_err();

    match &err {
        FetchError::UnsupportedContentType(mime) => assert_eq!(mime, "image/png"),
        other => panic!("expected UnsupportedContentType, got {:?}", other),
    }
    // Policy rejections must not trigger the rendered fallback
    assert!(err.is_terminal());
}

#[tokio::test]
async fn test_http_404_fails_the_phase_but_is_not_terminal() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let err = fetcher(1024)
        .fetch(&format!("{}/missing", server.url()))
        .await
        .unwrap_err();

    match &err {
        FetchError::Http { status, .. } => assert_eq!(*status, 404),
        other => panic!("expected Http error, got {:?}", other),
    }
    // The rendered phase is still allowed to try
    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_body_over_the_size_cap_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/big")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("x".repeat(2048))
        .create_async()
        .await;

    let err = fetcher(1024)
        .fetch(&format!("{}/big", server.url()))
        .await
        .unwrap_err();

    match err {
        FetchError::ContentTooLarge { limit, .. } => assert_eq!(limit, 1024),
        other => panic!("expected ContentTooLarge, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_a_phase_failure() {
    // Nothing listens on this port
    let err = fetcher(1024)
        .fetch("http://127.0.0.1:9/nothing")
        .await
        .unwrap_err();

    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_non_web_scheme_is_rejected() {
    let err = fetcher(1024).fetch("ftp://example.com/x").await.unwrap_err();
    match err {
        FetchError::InvalidUrl(_) => {}
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
}

#[tokio::test]
async fn test_json_content_type_is_allowed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let page = fetcher(1024)
        .fetch(&format!("{}/data", server.url()))
        .await
        .unwrap();
    assert_eq!(page.content_type, "application/json");
}
