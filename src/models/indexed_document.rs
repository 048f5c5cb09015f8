use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// An outbound link discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub url: String,
    pub text: String,
    pub title: Option<String>,
}

/// Document submitted to the full-text index.
///
/// The id is a deterministic function of the URL so that re-crawls
/// overwrite instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub keywords: Vec<String>,
    pub domain: String,
    pub crawl_date: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_type: String,
    pub language: String,
    pub word_count: usize,
    pub content_hash: String,
    /// Outbound links in document order
    pub links: Vec<DocumentLink>,
    pub metadata: HashMap<String, String>,
}

/// Stable 64-hex document id derived from the normalized URL
pub fn document_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
