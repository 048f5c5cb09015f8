//! The URL frontier: a durable, priority-ordered, retry-aware queue backed
//! by the metadata store.
//!
//! Uniqueness is enforced by the store's constraint on the normalized URL.
//! A session-local set of recently enqueued URLs sits in front of it as a
//! fast reject; it is an optimization, never the correctness barrier.

mod tests;

use crate::models::{UrlRecord, UrlStatus, MAX_ATTEMPTS};
use crate::storage::DatabasePool;
use chrono::Duration;
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FrontierError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result of an enqueue: the URL was inserted, or it was already known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added,
    Duplicate,
}

/// Terminal outcome reported back for a claimed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct FrontierStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

pub struct Frontier {
    pool: DatabasePool,
    /// URLs enqueued by this process during this session
    recent: Arc<DashSet<String>>,
}

impl Frontier {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            recent: Arc::new(DashSet::new()),
        }
    }

    /// Insert a normalized URL as a pending frontier entry.
    ///
    /// A second insertion of the same URL is a silent no-op and reports
    /// `Duplicate`.
    pub async fn enqueue(
        &self,
        url: &str,
        parent: Option<&str>,
        depth: i32,
        priority: i32,
        job_id: Option<Uuid>,
    ) -> Result<EnqueueOutcome> {
        if self.recent.contains(url) {
            return Ok(EnqueueOutcome::Duplicate);
        }

        let result = sqlx::query(
            "INSERT INTO url_queue (url, parent_url, depth, priority, job_id) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (url) DO NOTHING",
        )
        .bind(url)
        .bind(parent)
        .bind(depth)
        .bind(priority)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        self.recent.insert(url.to_string());

        if result.rows_affected() > 0 {
            debug!("Enqueued {} (depth {})", url, depth);
            Ok(EnqueueOutcome::Added)
        } else {
            Ok(EnqueueOutcome::Duplicate)
        }
    }

    /// Atomically claim up to `n` eligible records.
    ///
    /// Eligible: pending, scheduled_at in the past, attempts below the cap.
    /// Claimed records flip to processing and have attempts incremented in
    /// the same statement, so a claim is never observable without its
    /// attempt. Ordered by priority (desc) then insertion time.
    pub async fn claim_batch(&self, n: i64) -> Result<Vec<UrlRecord>> {
        // scheduled_at doubles as the claim timestamp while processing;
        // release_stalled keys off it
        let query = r#"
            UPDATE url_queue
            SET status = 'processing', attempts = attempts + 1, scheduled_at = now()
            WHERE id IN (
                SELECT id FROM url_queue
                WHERE status = 'pending'
                  AND scheduled_at <= now()
                  AND attempts < $1
                ORDER BY priority DESC, created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, url, parent_url, depth, priority, job_id, status,
                      attempts, created_at, scheduled_at, error_message
        "#;

        let records = sqlx::query_as::<_, UrlRecord>(query)
            .bind(MAX_ATTEMPTS)
            .bind(n)
            .fetch_all(&self.pool)
            .await?;

        if !records.is_empty() {
            debug!("Claimed {} frontier records", records.len());
        }
        Ok(records)
    }

    /// The single Frontier-owned terminal transition for a record
    pub async fn complete(
        &self,
        id: Uuid,
        outcome: CrawlOutcome,
        error_message: Option<&str>,
    ) -> Result<()> {
        let status = match outcome {
            CrawlOutcome::Completed => UrlStatus::Completed,
            CrawlOutcome::Failed => UrlStatus::Failed,
        };

        sqlx::query("UPDATE url_queue SET status = $1, error_message = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Move failed records with attempts left back to pending, eligible
    /// again after `delay`.
    pub async fn reschedule_failed(&self, delay: Duration) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE url_queue \
             SET status = 'pending', scheduled_at = now() + make_interval(secs => $1) \
             WHERE status = 'failed' AND attempts < $2",
        )
        .bind(delay.num_seconds() as f64)
        .bind(MAX_ATTEMPTS)
        .execute(&self.pool)
        .await?;

        let rescheduled = result.rows_affected();
        if rescheduled > 0 {
            info!("Rescheduled {} failed frontier records", rescheduled);
        }
        Ok(rescheduled)
    }

    /// Return records stuck in processing (e.g. after a worker crash) to
    /// pending so another claim can pick them up.
    pub async fn release_stalled(&self, older_than: Duration) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE url_queue \
             SET status = 'pending', scheduled_at = now() \
             WHERE status = 'processing' \
               AND scheduled_at <= now() - make_interval(secs => $1) \
               AND attempts < $2",
        )
        .bind(older_than.num_seconds() as f64)
        .bind(MAX_ATTEMPTS)
        .execute(&self.pool)
        .await?;

        let released = result.rows_affected();
        if released > 0 {
            info!("Released {} stalled frontier claims", released);
        }
        Ok(released)
    }

    /// Counts by status
    pub async fn stats(&self) -> Result<FrontierStats> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM url_queue GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut stats = FrontierStats::default();
        for (status, count) in rows {
            match status.as_str() {
                "pending" => stats.pending = count,
                "processing" => stats.processing = count,
                "completed" => stats.completed = count,
                "failed" => stats.failed = count,
                _ => {}
            }
        }
        Ok(stats)
    }

    /// Whether this session already enqueued the URL (fast reject only)
    pub fn recently_enqueued(&self, url: &str) -> bool {
        self.recent.contains(url)
    }
}
