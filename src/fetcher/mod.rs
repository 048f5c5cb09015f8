//! Dual-mode page acquisition: a plain HTTP phase with size/type guards,
//! and a headless-browser fallback for pages the plain phase cannot get.

pub mod browser;
pub mod http;
mod tests;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

use crate::config::CrawlerConfig;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Content too large: {size} bytes (limit: {limit})")]
    ContentTooLarge { size: usize, limit: usize },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    /// Terminal outcomes never trigger the rendered fallback: the response
    /// itself was readable, it just violates policy.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchError::UnsupportedContentType(_)
                | FetchError::ContentTooLarge { .. }
                | FetchError::InvalidUrl(_)
        )
    }
}

/// A successfully acquired page body with its transport metadata
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub final_url: String,
    pub body: String,
    pub content_type: String,
    pub status_code: u16,
    pub last_modified: Option<DateTime<Utc>>,
    pub headers: HeaderMap,
    pub fetch_time_ms: u64,
    /// Whether the rendered phase produced this body
    pub rendered: bool,
}

pub struct PageFetcher {
    http: HttpFetcher,
    browser: Option<BrowserFetcher>,
}

impl PageFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let http = HttpFetcher::new(
            config.request_timeout(),
            config.network.max_page_size,
            config.network.allowed_content_types.clone(),
            config.crawler.user_agent.clone(),
        )?;

        let browser = if config.network.enable_rendered_phase {
            Some(BrowserFetcher::new(config.request_timeout()))
        } else {
            None
        };

        Ok(Self { http, browser })
    }

    /// Fetch a URL: plain HTTP first, rendered fallback second.
    ///
    /// Terminal plain-phase outcomes (unsupported MIME, oversize) are
    /// returned as-is; transport failures and HTTP >= 400 fall through to
    /// the rendered phase when it is enabled.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self.http.fetch(url).await {
            Ok(page) => Ok(page),
            Err(e) if e.is_terminal() => Err(e),
            Err(e) => match &self.browser {
                Some(browser) => {
                    debug!("Plain fetch of {} failed ({}), trying rendered phase", url, e);
                    browser.fetch(url).await
                }
                None => Err(e),
            },
        }
    }

    /// Tear down the shared browser handle, if one was launched
    pub async fn shutdown(&self) {
        if let Some(browser) = &self.browser {
            browser.shutdown().await;
        }
    }
}
