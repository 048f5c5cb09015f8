//! Plain HTTP acquisition with size and content-type guards.

use super::{FetchError, FetchedPage};
use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct HttpFetcher {
    client: Client,
    max_page_size: usize,
    allowed_content_types: Vec<String>,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(
        timeout: Duration,
        max_page_size: usize,
        allowed_content_types: Vec<String>,
        user_agent: String,
    ) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            max_page_size,
            allowed_content_types,
            user_agent,
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start_time = Instant::now();
        debug!("Fetching URL: {}", url);

        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(FetchError::InvalidUrl(format!(
                    "Unsupported scheme: {}",
                    scheme
                )))
            }
        }

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/json;q=0.9,text/plain;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, url))?;

        let status_code = response.status().as_u16();
        if status_code >= 400 {
            return Err(FetchError::Http {
                status: status_code,
                url: url.to_string(),
            });
        }

        let headers = response.headers().clone();
        let final_url = response.url().to_string();

        let raw_content_type = raw_content_type(&headers);
        let content_type = strip_mime_params(&raw_content_type);
        if !self.is_allowed_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        // Fail fast when the origin declares an oversized body
        if let Some(declared) = content_length(&headers) {
            if declared > self.max_page_size {
                return Err(FetchError::ContentTooLarge {
                    size: declared,
                    limit: self.max_page_size,
                });
            }
        }

        // Stream the body so the cap holds even without a Content-Length
        let mut body = Vec::with_capacity(8 * 1024);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| classify_reqwest_error(e, url))?;
            if body.len() + chunk.len() > self.max_page_size {
                return Err(FetchError::ContentTooLarge {
                    size: body.len() + chunk.len(),
                    limit: self.max_page_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let text = decode_content(&body, &raw_content_type);
        let last_modified = parse_last_modified(&headers);
        let fetch_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Fetched {} ({} bytes, {} ms)",
            url,
            body.len(),
            fetch_time_ms
        );

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            body: text,
            content_type,
            status_code,
            last_modified,
            headers,
            fetch_time_ms,
            rendered: false,
        })
    }

    fn is_allowed_content_type(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| content_type.starts_with(allowed.as_str()))
    }
}

/// Convert reqwest errors into the fetch taxonomy with URL context
pub(super) fn classify_reqwest_error(error: reqwest::Error, url: &str) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else if error.is_connect() {
        FetchError::Connection(format!("Failed to connect to {}", url))
    } else if let Some(status) = error.status() {
        FetchError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        }
    } else {
        FetchError::Request(error)
    }
}

fn raw_content_type(headers: &HeaderMap) -> String {
    headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string()
}

fn strip_mime_params(raw: &str) -> String {
    raw.split(';').next().unwrap_or(raw).trim().to_lowercase()
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn parse_last_modified(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get("last-modified")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn decode_content(bytes: &[u8], content_type: &str) -> String {
    let encoding = detect_encoding(bytes, content_type);
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!("Encoding errors while decoding content");
    }
    decoded.to_string()
}

fn detect_encoding(bytes: &[u8], content_type: &str) -> &'static Encoding {
    if let Some(charset) = charset_from_content_type(content_type) {
        if let Some(encoding) = Encoding::for_label(charset.as_bytes()) {
            return encoding;
        }
    }

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return UTF_8;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return encoding_rs::UTF_16LE;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return encoding_rs::UTF_16BE;
    }

    // Peek at the document head for a meta charset
    let head = &bytes[..bytes.len().min(1024)];
    if let Ok(text) = std::str::from_utf8(head) {
        if let Some(start) = text.find("charset=") {
            let rest = &text[start + 8..];
            let end = rest
                .find(|c| c == '"' || c == '\'' || c == ' ' || c == '>')
                .unwrap_or(rest.len());
            if let Some(encoding) = Encoding::for_label(rest[..end].trim().as_bytes()) {
                return encoding;
            }
        }
    }

    UTF_8
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let trimmed = part.trim();
        trimmed
            .strip_prefix("charset=")
            .map(|charset| charset.trim().to_string())
    })
}
