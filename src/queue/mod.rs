//! Transient job dispatch between the frontier pump and crawl handlers.
//!
//! The queue owns retry/backoff for dispatched jobs; the frontier remains
//! the durable source of truth for URL state.

pub mod redis_queue;
mod tests;

pub use redis_queue::RedisJobQueue;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Queue is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Payload of a `crawl-page` job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPageJob {
    /// Frontier record this job was dispatched for
    pub record_id: Uuid,
    pub url: String,
    pub depth: i32,
    pub job_id: Option<Uuid>,
}

/// Dispatch options supplied at enqueue time
#[derive(Debug, Clone, Copy)]
pub struct JobOptions {
    pub priority: i32,
    pub delay_ms: u64,
    pub attempts: u32,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            priority: 5,
            delay_ms: 0,
            attempts: 3,
        }
    }
}

/// A job handed to a crawl handler; passed back on completion or failure
#[derive(Debug, Clone)]
pub struct ActiveJob {
    pub id: String,
    pub payload: CrawlPageJob,
    /// 1-based attempt number for this execution
    pub attempt: u32,
    pub max_attempts: u32,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub active: u64,
    pub waiting: u64,
    pub delayed: u64,
    pub completed: u64,
    pub failed: u64,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a crawl-page job; returns the queue-assigned job id
    async fn enqueue(&self, payload: CrawlPageJob, opts: JobOptions) -> Result<String>;

    /// Pop the next ready job, if any. Returns `None` when the queue is
    /// empty or closed.
    async fn next(&self) -> Result<Option<ActiveJob>>;

    async fn complete(&self, job: &ActiveJob) -> Result<()>;

    /// Record a failure. Requeues with exponential backoff while attempts
    /// remain; otherwise the job lands in the failed set.
    async fn fail(&self, job: &ActiveJob, error: &str) -> Result<()>;

    /// Requeue jobs whose handler stopped heartbeating (crashed worker)
    async fn recover_stalled(&self) -> Result<u64>;

    async fn counts(&self) -> Result<QueueCounts>;

    /// Stop handing out jobs; in-flight jobs may still complete or fail
    async fn close(&self) -> Result<()>;
}
