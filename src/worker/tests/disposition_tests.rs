use crate::fetcher::FetchError;
use crate::worker::{disposition_for, CrawlError, CrawlSuccess, Disposition};

#[test]
fn test_indexed_and_skipped_complete_the_job() {
    assert_eq!(
        disposition_for(&Ok(CrawlSuccess::Indexed)),
        Disposition::Complete
    );
    assert_eq!(
        disposition_for(&Ok(CrawlSuccess::Skipped)),
        Disposition::Complete
    );
}

#[test]
fn test_robots_disallow_is_terminal_with_fixed_reason() {
    match disposition_for(&Ok(CrawlSuccess::Disallowed)) {
        Disposition::PolicyFailure(reason) => {
            assert_eq!(reason, "Disallowed by robots.txt");
        }
        other => panic!("expected policy failure, got {:?}", other),
    }
}

#[test]
fn test_extraction_failure_is_not_retried() {
    match disposition_for(&Err(CrawlError::ExtractionFailed)) {
        Disposition::PolicyFailure(reason) => {
            assert_eq!(reason, "Content extraction failed");
        }
        other => panic!("expected policy failure, got {:?}", other),
    }
}

#[test]
fn test_unsupported_mime_is_not_retried() {
    let result = Err(CrawlError::Fetch(FetchError::UnsupportedContentType(
        "image/png".to_string(),
    )));
    match disposition_for(&result) {
        Disposition::PolicyFailure(reason) => assert!(reason.contains("image/png")),
        other => panic!("expected policy failure, got {:?}", other),
    }
}

#[test]
fn test_client_errors_are_terminal_but_server_errors_retry() {
    let not_found = Err(CrawlError::Fetch(FetchError::Http {
        status: 404,
        url: "https://example.com/missing".to_string(),
    }));
    assert!(matches!(
        disposition_for(&not_found),
        Disposition::PolicyFailure(_)
    ));

    let bad_gateway = Err(CrawlError::Fetch(FetchError::Http {
        status: 502,
        url: "https://example.com/flaky".to_string(),
    }));
    assert!(matches!(
        disposition_for(&bad_gateway),
        Disposition::RetryableFailure(_)
    ));
}

#[test]
fn test_transient_network_failures_retry() {
    for err in [
        FetchError::Timeout("https://example.com".to_string()),
        FetchError::Connection("refused".to_string()),
    ] {
        let result = Err(CrawlError::Fetch(err));
        assert!(
            matches!(disposition_for(&result), Disposition::RetryableFailure(_)),
            "expected retry for {:?}",
            result
        );
    }
}
