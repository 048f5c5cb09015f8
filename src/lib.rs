//! Distributed web crawler library
//!
//! The crawl pipeline: URL normalization, a durable frontier, per-host
//! politeness (robots + rate limiting), dual-mode fetching, content
//! extraction and a worker loop that feeds a full-text index.

pub mod config;
pub mod models;
pub mod urls;
pub mod frontier;
pub mod robots;
pub mod ratelimit;
pub mod fetcher;
pub mod extractor;
pub mod queue;
pub mod storage;
pub mod search;
pub mod worker;

// Re-export commonly used types
pub use config::CrawlerConfig;
pub use models::{CrawlJob, CrawledPage, IndexedDocument, UrlRecord};
pub use worker::Worker;

/// Main crawler error type
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize logging for the crawler process
pub fn init() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
