//! Redis-backed job queue: a ready set ordered by priority and age, a
//! delayed set for backoff, and an active hash for stall detection.

use super::{ActiveJob, CrawlPageJob, JobOptions, JobQueue, QueueCounts, QueueError, Result};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Retry backoff base (doubles per attempt)
const BACKOFF_BASE_MS: u64 = 5_000;

/// Active jobs older than this are considered stalled
const STALL_TIMEOUT_MS: i64 = 120_000;

/// Weight that makes priority dominate enqueue age in the ready ordering
const PRIORITY_WEIGHT: f64 = 1e10;

const KEY_READY: &str = "trawler:queue:crawl-page:ready";
const KEY_DELAYED: &str = "trawler:queue:crawl-page:delayed";
const KEY_ACTIVE: &str = "trawler:queue:crawl-page:active";
const KEY_FAILED: &str = "trawler:queue:crawl-page:failed";
const KEY_COMPLETED: &str = "trawler:queue:crawl-page:completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobEnvelope {
    id: String,
    payload: CrawlPageJob,
    priority: i32,
    attempt: u32,
    max_attempts: u32,
    enqueued_at: i64,
    started_at: Option<i64>,
    last_error: Option<String>,
}

pub struct RedisJobQueue {
    conn: ConnectionManager,
    closed: AtomicBool,
}

impl RedisJobQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Job queue connected");
        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    fn ready_score(priority: i32, now_ms: i64) -> f64 {
        // Lower scores pop first: higher priority wins, ties go to the
        // earlier enqueue
        now_ms as f64 - priority as f64 * PRIORITY_WEIGHT
    }

    /// Move due delayed jobs into the ready set
    async fn promote_delayed(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let now_ms = Utc::now().timestamp_millis();

        let due: Vec<String> = conn
            .zrangebyscore_limit(KEY_DELAYED, 0f64, now_ms as f64, 0, 100)
            .await?;

        for member in due {
            // Only the worker that wins the removal re-adds the job
            let removed: i64 = conn.zrem(KEY_DELAYED, &member).await?;
            if removed == 0 {
                continue;
            }
            let priority = serde_json::from_str::<JobEnvelope>(&member)
                .map(|env| env.priority)
                .unwrap_or(0);
            let _: () = conn
                .zadd(KEY_READY, &member, Self::ready_score(priority, now_ms))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, payload: CrawlPageJob, opts: JobOptions) -> Result<String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }

        let now_ms = Utc::now().timestamp_millis();
        let envelope = JobEnvelope {
            id: Uuid::new_v4().to_string(),
            payload,
            priority: opts.priority,
            attempt: 0,
            max_attempts: opts.attempts.max(1),
            enqueued_at: now_ms,
            started_at: None,
            last_error: None,
        };
        let member = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        if opts.delay_ms > 0 {
            let ready_at = now_ms + opts.delay_ms as i64;
            let _: () = conn.zadd(KEY_DELAYED, &member, ready_at as f64).await?;
        } else {
            let _: () = conn
                .zadd(KEY_READY, &member, Self::ready_score(opts.priority, now_ms))
                .await?;
        }

        debug!("Enqueued crawl-page job {} for {}", envelope.id, envelope.payload.url);
        Ok(envelope.id)
    }

    async fn next(&self) -> Result<Option<ActiveJob>> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(None);
        }

        self.promote_delayed().await?;

        let mut conn = self.conn.clone();
        let popped: Vec<(String, f64)> = conn.zpopmin(KEY_READY, 1).await?;
        let member = match popped.into_iter().next() {
            Some((member, _)) => member,
            None => return Ok(None),
        };

        let mut envelope: JobEnvelope = serde_json::from_str(&member)?;
        envelope.attempt += 1;
        envelope.started_at = Some(Utc::now().timestamp_millis());

        let active_json = serde_json::to_string(&envelope)?;
        let _: () = conn.hset(KEY_ACTIVE, &envelope.id, &active_json).await?;

        Ok(Some(ActiveJob {
            id: envelope.id,
            payload: envelope.payload,
            attempt: envelope.attempt,
            max_attempts: envelope.max_attempts,
            priority: envelope.priority,
        }))
    }

    async fn complete(&self, job: &ActiveJob) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(KEY_ACTIVE, &job.id).await?;
        let _: () = conn.incr(KEY_COMPLETED, 1u64).await?;
        Ok(())
    }

    async fn fail(&self, job: &ActiveJob, error: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(KEY_ACTIVE, &job.id).await?;

        let now_ms = Utc::now().timestamp_millis();
        let envelope = JobEnvelope {
            id: job.id.clone(),
            payload: job.payload.clone(),
            priority: job.priority,
            attempt: job.attempt,
            max_attempts: job.max_attempts,
            enqueued_at: now_ms,
            started_at: None,
            last_error: Some(error.to_string()),
        };
        let member = serde_json::to_string(&envelope)?;

        if job.attempt < job.max_attempts {
            // Exponential backoff: 5s, 10s, 20s, ...
            let exponent = job.attempt.saturating_sub(1).min(16);
            let backoff_ms = BACKOFF_BASE_MS.saturating_mul(1u64 << exponent);
            let ready_at = now_ms + backoff_ms as i64;
            let _: () = conn.zadd(KEY_DELAYED, &member, ready_at as f64).await?;
            debug!(
                "Requeued job {} (attempt {}/{}) in {} ms: {}",
                job.id, job.attempt, job.max_attempts, backoff_ms, error
            );
        } else {
            let _: () = conn.rpush(KEY_FAILED, &member).await?;
            warn!(
                "Job {} exhausted {} attempts: {}",
                job.id, job.max_attempts, error
            );
        }
        Ok(())
    }

    async fn recover_stalled(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let active: std::collections::HashMap<String, String> = conn.hgetall(KEY_ACTIVE).await?;

        let now_ms = Utc::now().timestamp_millis();
        let mut recovered = 0u64;

        for (id, json) in active {
            let envelope: JobEnvelope = match serde_json::from_str(&json) {
                Ok(envelope) => envelope,
                Err(_) => continue,
            };
            let stalled = envelope
                .started_at
                .map(|started| now_ms - started > STALL_TIMEOUT_MS)
                .unwrap_or(true);
            if !stalled {
                continue;
            }

            let removed: i64 = conn.hdel(KEY_ACTIVE, &id).await?;
            if removed == 0 {
                continue;
            }
            let _: () = conn
                .zadd(
                    KEY_READY,
                    &json,
                    Self::ready_score(envelope.priority, now_ms),
                )
                .await?;
            recovered += 1;
        }

        if recovered > 0 {
            info!("Recovered {} stalled jobs", recovered);
        }
        Ok(recovered)
    }

    async fn counts(&self) -> Result<QueueCounts> {
        let mut conn = self.conn.clone();
        let waiting: u64 = conn.zcard(KEY_READY).await?;
        let delayed: u64 = conn.zcard(KEY_DELAYED).await?;
        let active: u64 = conn.hlen(KEY_ACTIVE).await?;
        let failed: u64 = conn.llen(KEY_FAILED).await?;
        let completed: u64 = conn.get::<_, Option<u64>>(KEY_COMPLETED).await?.unwrap_or(0);

        Ok(QueueCounts {
            active,
            waiting,
            delayed,
            completed,
            failed,
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        info!("Job queue closed");
        Ok(())
    }
}
