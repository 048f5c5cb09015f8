//! Repository for the crawled-page store

use crate::models::CrawledPage;
use crate::storage::{DatabasePool, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Fields persisted for a page after a successful crawl
#[derive(Debug, Clone)]
pub struct PageUpsert {
    pub url: String,
    pub title: Option<String>,
    pub content_hash: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub status_code: i32,
    pub content_type: String,
    pub word_count: i32,
    pub domain: String,
}

pub struct PageRepository {
    pool: DatabasePool,
}

impl PageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Upsert a page record after a successful crawl.
    ///
    /// Keyed by normalized URL; resets the error count and marks the page
    /// indexed.
    pub async fn upsert(&self, page: &PageUpsert) -> Result<CrawledPage> {
        let query = r#"
            INSERT INTO crawled_pages (
                url, title, content_hash, last_crawled, last_modified,
                status_code, content_type, word_count, domain, indexed, error_count
            ) VALUES ($1, $2, $3, now(), $4, $5, $6, $7, $8, TRUE, 0)
            ON CONFLICT (url)
            DO UPDATE SET
                title = EXCLUDED.title,
                content_hash = EXCLUDED.content_hash,
                last_crawled = EXCLUDED.last_crawled,
                last_modified = EXCLUDED.last_modified,
                status_code = EXCLUDED.status_code,
                content_type = EXCLUDED.content_type,
                word_count = EXCLUDED.word_count,
                domain = EXCLUDED.domain,
                indexed = TRUE,
                error_count = 0
            RETURNING id, url, title, content_hash, last_crawled, last_modified,
                      status_code, content_type, word_count, domain, indexed, error_count
        "#;

        let page = sqlx::query_as::<_, CrawledPage>(query)
            .bind(&page.url)
            .bind(&page.title)
            .bind(&page.content_hash)
            .bind(page.last_modified)
            .bind(page.status_code)
            .bind(&page.content_type)
            .bind(page.word_count)
            .bind(&page.domain)
            .fetch_one(&self.pool)
            .await?;

        debug!("Saved page: {}", page.url);
        Ok(page)
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<CrawledPage>> {
        let query = r#"
            SELECT id, url, title, content_hash, last_crawled, last_modified,
                   status_code, content_type, word_count, domain, indexed, error_count
            FROM crawled_pages WHERE url = $1
        "#;

        let page = sqlx::query_as::<_, CrawledPage>(query)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(page)
    }

    pub async fn url_exists(&self, url: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM crawled_pages WHERE url = $1")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Bump the error counter for a page that failed to re-crawl
    pub async fn record_error(&self, url: &str) -> Result<()> {
        sqlx::query("UPDATE crawled_pages SET error_count = error_count + 1 WHERE url = $1")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM crawled_pages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
