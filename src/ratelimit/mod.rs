//! Per-host minimum inter-request spacing, shared across workers.
//!
//! Two tiers: a process-local map of last-request instants (this alone
//! guarantees spacing within a process) and shared Redis state so separate
//! worker processes observe each other's requests. The shared tier is
//! best-effort: concurrent waiters may briefly exceed the target rate, and
//! any backend error degrades to the local tier. The limiter is advisory,
//! never a lock, and never fails a caller.

mod tests;

use chrono::Utc;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shared keys age out after an hour so stale hosts disappear
const KEY_TTL_SECS: u64 = 3600;

pub struct RateLimiter {
    shared: Option<ConnectionManager>,
    last_request: DashMap<String, Instant>,
    delays: DashMap<String, Duration>,
    default_delay: Duration,
}

impl RateLimiter {
    /// Limiter with shared Redis state. Falls back to local-only operation
    /// if the connection cannot be established.
    pub async fn connect(redis_url: &str, default_delay: Duration) -> Self {
        let shared = match redis::Client::open(redis_url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(manager) => Some(manager),
                Err(e) => {
                    warn!("Rate limiter running local-only (redis unavailable: {})", e);
                    None
                }
            },
            Err(e) => {
                warn!("Rate limiter running local-only (bad redis URL: {})", e);
                None
            }
        };

        Self {
            shared,
            last_request: DashMap::new(),
            delays: DashMap::new(),
            default_delay,
        }
    }

    /// Local-only limiter (tests, degraded operation)
    pub fn local(default_delay: Duration) -> Self {
        Self {
            shared: None,
            last_request: DashMap::new(),
            delays: DashMap::new(),
            default_delay,
        }
    }

    /// Override the per-host delay (e.g. robots crawl-delay scaled to ms)
    pub async fn set_delay(&self, host: &str, delay_ms: u64) {
        let delay = Duration::from_millis(delay_ms);
        self.delays.insert(host.to_string(), delay);

        if let Some(manager) = &self.shared {
            let mut conn = manager.clone();
            let key = format!("ratelimit:delay:{}", host);
            let result: redis::RedisResult<()> = conn.set_ex(&key, delay_ms, KEY_TTL_SECS).await;
            if let Err(e) = result {
                warn!("Failed to store delay for {}: {}", host, e);
            }
        }
    }

    /// Sleep until a request to `host` is polite, then stamp the request.
    ///
    /// Between two successful calls in one process the second returns no
    /// earlier than the host delay after the first.
    pub async fn wait(&self, host: &str) {
        let delay = self.delay_for(host).await;

        let local_remaining = self
            .last_request
            .get(host)
            .map(|last| delay.saturating_sub(last.elapsed()))
            .unwrap_or(Duration::ZERO);

        let shared_remaining = self.shared_remaining(host, delay).await;
        let remaining = local_remaining.max(shared_remaining);

        if !remaining.is_zero() {
            debug!("Rate limit: waiting {:?} for {}", remaining, host);
            tokio::time::sleep(remaining).await;
        }

        self.last_request.insert(host.to_string(), Instant::now());
        self.stamp_shared(host).await;
    }

    async fn delay_for(&self, host: &str) -> Duration {
        if let Some(delay) = self.delays.get(host) {
            return *delay;
        }

        if let Some(manager) = &self.shared {
            let mut conn = manager.clone();
            let key = format!("ratelimit:delay:{}", host);
            match conn.get::<_, Option<u64>>(&key).await {
                Ok(Some(ms)) => return Duration::from_millis(ms),
                Ok(None) => {}
                Err(e) => warn!("Failed to read delay for {}: {}", host, e),
            }
        }

        self.default_delay
    }

    /// Remaining wait implied by the shared last-request stamp, if readable
    async fn shared_remaining(&self, host: &str, delay: Duration) -> Duration {
        let manager = match &self.shared {
            Some(manager) => manager,
            None => return Duration::ZERO,
        };

        let mut conn = manager.clone();
        let key = format!("ratelimit:last:{}", host);
        match conn.get::<_, Option<i64>>(&key).await {
            Ok(Some(last_ms)) => {
                let elapsed_ms = (Utc::now().timestamp_millis() - last_ms).max(0) as u64;
                delay.saturating_sub(Duration::from_millis(elapsed_ms))
            }
            Ok(None) => Duration::ZERO,
            Err(e) => {
                warn!("Failed to read last-request for {}: {}", host, e);
                Duration::ZERO
            }
        }
    }

    async fn stamp_shared(&self, host: &str) {
        if let Some(manager) = &self.shared {
            let mut conn = manager.clone();
            let key = format!("ratelimit:last:{}", host);
            let now_ms = Utc::now().timestamp_millis();
            let result: redis::RedisResult<()> = conn.set_ex(&key, now_ms, KEY_TTL_SECS).await;
            if let Err(e) = result {
                warn!("Failed to stamp last-request for {}: {}", host, e);
            }
        }
    }
}
