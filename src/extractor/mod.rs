//! Content extraction: HTML, JSON and plain-text bodies into structured
//! records ready for indexing.

mod html;
mod tests;

use crate::models::DocumentLink;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// Character caps applied to extracted fields
pub(crate) const MAX_TITLE_CHARS: usize = 200;
pub(crate) const MAX_DESCRIPTION_CHARS: usize = 500;
pub(crate) const MAX_CONTENT_CHARS: usize = 50_000;
pub(crate) const MAX_ANCHOR_CHARS: usize = 100;
pub(crate) const MAX_KEYWORDS: usize = 20;
pub(crate) const MAX_LANGUAGE_CHARS: usize = 5;

/// Structured content pulled out of a fetched body
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub keywords: Vec<String>,
    pub links: Vec<DocumentLink>,
    pub metadata: HashMap<String, String>,
    pub language: String,
    pub word_count: usize,
    /// SHA-256 hex of the cleaned content; the change-detection key
    pub content_hash: String,
}

pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract structured content from a body, dispatching on MIME type.
    /// Returns `None` for unparseable or unsupported input.
    pub fn extract(&self, body: &str, content_type: &str, url: &str) -> Option<ExtractedContent> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_lowercase();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Some(html::extract_html(body, url)),
            "text/plain" => Some(self.extract_plain_text(body)),
            "application/json" => self.extract_json(body),
            // Accepted by MIME but no text layer is pulled out yet
            "application/pdf" => Some(self.empty_record()),
            other => {
                debug!("No extractor for content type: {}", other);
                None
            }
        }
    }

    fn extract_plain_text(&self, body: &str) -> ExtractedContent {
        let content = clean_text(body);
        let word_count = content.split_whitespace().count();
        let content_hash = content_hash(&content);

        ExtractedContent {
            title: None,
            description: None,
            content,
            keywords: Vec::new(),
            links: Vec::new(),
            metadata: HashMap::new(),
            language: "en".to_string(),
            word_count,
            content_hash,
        }
    }

    fn extract_json(&self, body: &str) -> Option<ExtractedContent> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let content = serde_json::to_string_pretty(&value).ok()?;
        let word_count = content.split_whitespace().count();
        let content_hash = content_hash(&content);

        Some(ExtractedContent {
            title: None,
            description: None,
            content,
            keywords: Vec::new(),
            links: Vec::new(),
            metadata: HashMap::new(),
            language: "en".to_string(),
            word_count,
            content_hash,
        })
    }

    fn empty_record(&self) -> ExtractedContent {
        ExtractedContent {
            title: None,
            description: None,
            content: String::new(),
            keywords: Vec::new(),
            links: Vec::new(),
            metadata: HashMap::new(),
            language: "en".to_string(),
            word_count: 0,
            content_hash: content_hash(""),
        }
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace runs to single spaces and cap the length
pub(crate) fn clean_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_CONTENT_CHARS)
}

/// SHA-256 hex digest of a content string
pub(crate) fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Char-boundary-safe truncation
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
