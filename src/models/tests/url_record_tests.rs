use crate::models::{UrlRecord, UrlStatus};
use chrono::Utc;
use uuid::Uuid;

fn record_with(status: &str, attempts: i32) -> UrlRecord {
    UrlRecord {
        id: Uuid::new_v4(),
        url: "https://example.com/a".to_string(),
        parent_url: None,
        depth: 0,
        priority: 5,
        job_id: None,
        status: status.to_string(),
        attempts,
        created_at: Utc::now(),
        scheduled_at: Utc::now(),
        error_message: None,
    }
}

#[test]
fn test_status_parsing() {
    assert_eq!(record_with("pending", 0).status(), Some(UrlStatus::Pending));
    assert_eq!(
        record_with("processing", 1).status(),
        Some(UrlStatus::Processing)
    );
    assert_eq!(
        record_with("completed", 1).status(),
        Some(UrlStatus::Completed)
    );
    assert_eq!(record_with("failed", 3).status(), Some(UrlStatus::Failed));
    assert_eq!(record_with("garbage", 0).status(), None);
}

#[test]
fn test_attempts_cap() {
    assert!(!record_with("failed", 2).attempts_exhausted());
    assert!(record_with("failed", 3).attempts_exhausted());
}

#[test]
fn test_status_display_matches_stored_values() {
    for status in [
        UrlStatus::Pending,
        UrlStatus::Processing,
        UrlStatus::Completed,
        UrlStatus::Failed,
    ] {
        let record = record_with(status.as_str(), 0);
        assert_eq!(record.status(), Some(status));
    }
}
