use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored record of a successfully crawled page.
///
/// This is the "have we seen this recently" oracle: a page whose
/// `last_crawled` falls inside the recency window is not re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrawledPage {
    pub id: Uuid,
    /// Normalized URL, unique per page
    pub url: String,
    pub title: Option<String>,
    pub content_hash: Option<String>,
    pub last_crawled: Option<DateTime<Utc>>,
    /// Last-Modified reported by the origin
    pub last_modified: Option<DateTime<Utc>>,
    pub status_code: Option<i32>,
    pub content_type: Option<String>,
    pub word_count: Option<i32>,
    pub domain: Option<String>,
    pub indexed: bool,
    pub error_count: i32,
}

impl CrawledPage {
    /// Whether this page was crawled within the recency window
    pub fn is_fresh(&self, now: DateTime<Utc>, window_hours: i64) -> bool {
        match self.last_crawled {
            Some(last) => now - last < Duration::hours(window_hours),
            None => false,
        }
    }
}
