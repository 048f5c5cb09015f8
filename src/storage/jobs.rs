//! Repository for crawl jobs and their aggregate progress

use crate::models::CrawlJob;
use crate::storage::{DatabasePool, Result};
use tracing::{debug, info};
use uuid::Uuid;

pub struct JobRepository {
    pool: DatabasePool,
}

impl JobRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create a crawl job for a seed URL
    pub async fn create(
        &self,
        seed_url: &str,
        max_depth: i32,
        domain_filter: &[String],
        priority: i32,
    ) -> Result<CrawlJob> {
        let query = r#"
            INSERT INTO crawl_jobs (url, max_depth, domain_filter, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING id, url, status, priority, depth, max_depth, domain_filter,
                      created_at, started_at, completed_at, error_message,
                      pages_crawled, pages_indexed
        "#;

        let job = sqlx::query_as::<_, CrawlJob>(query)
            .bind(seed_url)
            .bind(max_depth)
            .bind(domain_filter)
            .bind(priority)
            .fetch_one(&self.pool)
            .await?;

        info!("Created crawl job {} for {}", job.id, seed_url);
        Ok(job)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<CrawlJob>> {
        let query = r#"
            SELECT id, url, status, priority, depth, max_depth, domain_filter,
                   created_at, started_at, completed_at, error_message,
                   pages_crawled, pages_indexed
            FROM crawl_jobs WHERE id = $1
        "#;

        let job = sqlx::query_as::<_, CrawlJob>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    /// Mark a pending job in progress the first time one of its URLs is handled
    pub async fn mark_started(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE crawl_jobs SET status = 'in_progress', started_at = now() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Bump progress counters after a page resolves
    pub async fn record_progress(&self, id: Uuid, crawled: i32, indexed: i32) -> Result<()> {
        sqlx::query(
            "UPDATE crawl_jobs SET pages_crawled = pages_crawled + $1, \
             pages_indexed = pages_indexed + $2 WHERE id = $3",
        )
        .bind(crawled)
        .bind(indexed)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_failure(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query("UPDATE crawl_jobs SET error_message = $1 WHERE id = $2")
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolve the job's terminal status once none of its frontier records
    /// are still open: completed when anything was crawled or nothing went
    /// wrong, failed when nothing was crawled and an error was recorded.
    ///
    /// Returns true when the terminal transition happened.
    pub async fn try_finish(&self, id: Uuid) -> Result<bool> {
        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM url_queue \
             WHERE job_id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if open > 0 {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE crawl_jobs \
             SET status = CASE WHEN pages_crawled = 0 AND error_message IS NOT NULL \
                          THEN 'failed' ELSE 'completed' END, \
                 completed_at = now() \
             WHERE id = $1 AND status = 'in_progress'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let finished = result.rows_affected() > 0;
        if finished {
            debug!("Crawl job {} finished", id);
        }
        Ok(finished)
    }
}
