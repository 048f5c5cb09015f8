//! Per-host robots.txt acquisition, parsing and two-tier caching.
//!
//! Lookup order: in-process cache (24 h TTL), durable store (24 h TTL),
//! network fetch. Missing or unreachable robots files degrade to a
//! permissive policy; the whole subsystem is fail-open so a robots outage
//! never wedges the pipeline.

mod tests;

use crate::storage::DatabasePool;
use crate::urls::host_of;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use texting_robots::Robot;
use thiserror::Error;
use tracing::{debug, warn};

/// Default crawl delay in seconds when robots.txt specifies none
const DEFAULT_DELAY_SECS: u64 = 1;

/// Freshness window for both cache tiers
const TTL_HOURS: i64 = 24;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("URL has no host")]
    MissingHost,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),
}

/// Verdict for one URL: may it be fetched, and how long to wait per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPermission {
    pub allowed: bool,
    pub delay_secs: u64,
}

/// A parsed robots policy for one host
pub struct RobotsPolicy {
    robot: Option<Robot>,
    delay_secs: u64,
}

impl RobotsPolicy {
    /// Parse a robots.txt body for the given agent. Unparseable bodies
    /// degrade to permissive.
    pub fn parse(agent: &str, body: &str) -> Self {
        match Robot::new(agent, body.as_bytes()) {
            Ok(robot) => {
                let delay_secs = robot
                    .delay
                    .map(|d| d.ceil() as u64)
                    .unwrap_or(DEFAULT_DELAY_SECS);
                Self {
                    robot: Some(robot),
                    delay_secs,
                }
            }
            Err(_) => Self::permissive(DEFAULT_DELAY_SECS),
        }
    }

    /// A policy with no restrictions
    pub fn permissive(delay_secs: u64) -> Self {
        Self {
            robot: None,
            delay_secs,
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        match &self.robot {
            Some(robot) => robot.allowed(url),
            None => true,
        }
    }

    pub fn crawl_delay(&self) -> u64 {
        self.delay_secs
    }
}

enum FetchOutcome {
    /// A robots.txt body was retrieved
    Policy(String),
    /// Definitive absence (4xx, DNS); cacheable as permissive
    Absent,
    /// 5xx or network error; permissive for this call only
    Transient,
}

pub struct RobotsCache {
    memory: Cache<String, Arc<RobotsPolicy>>,
    pool: DatabasePool,
    client: reqwest::Client,
    user_agent: String,
    respect_robots: bool,
}

impl RobotsCache {
    pub fn new(pool: DatabasePool, user_agent: String, respect_robots: bool) -> Self {
        let memory = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(TTL_HOURS as u64 * 3600))
            .build();

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent.clone())
            .build()
            .expect("Failed to create robots HTTP client");

        Self {
            memory,
            pool,
            client,
            user_agent,
            respect_robots,
        }
    }

    /// Whether a URL may be crawled, and the delay to apply.
    ///
    /// Fail-open: configuration-disabled returns `{true, 0}`; any internal
    /// error returns `{true, 1}`.
    pub async fn can_crawl(&self, url: &str) -> CrawlPermission {
        if !self.respect_robots {
            return CrawlPermission {
                allowed: true,
                delay_secs: 0,
            };
        }

        match self.lookup(url).await {
            Ok(policy) => CrawlPermission {
                allowed: policy.is_allowed(url),
                delay_secs: policy.crawl_delay(),
            },
            Err(e) => {
                warn!("Robots lookup failed for {}: {} (failing open)", url, e);
                CrawlPermission {
                    allowed: true,
                    delay_secs: DEFAULT_DELAY_SECS,
                }
            }
        }
    }

    async fn lookup(&self, url: &str) -> Result<Arc<RobotsPolicy>, RobotsError> {
        let host = host_of(url).ok_or(RobotsError::MissingHost)?;

        if let Some(policy) = self.memory.get(&host) {
            return Ok(policy);
        }

        if let Some(policy) = self.load_from_store(&host).await? {
            let policy = Arc::new(policy);
            self.memory.insert(host, policy.clone());
            return Ok(policy);
        }

        match self.fetch_robots(&host).await {
            FetchOutcome::Policy(body) => {
                let policy = Arc::new(RobotsPolicy::parse(&self.user_agent, &body));
                self.persist(&host, Some(&body), policy.crawl_delay()).await?;
                self.memory.insert(host, policy.clone());
                Ok(policy)
            }
            FetchOutcome::Absent => {
                let policy = Arc::new(RobotsPolicy::permissive(DEFAULT_DELAY_SECS));
                self.persist(&host, None, DEFAULT_DELAY_SECS).await?;
                self.memory.insert(host, policy.clone());
                Ok(policy)
            }
            // Permissive for this call, but neither cache tier is touched
            FetchOutcome::Transient => Ok(Arc::new(RobotsPolicy::permissive(DEFAULT_DELAY_SECS))),
        }
    }

    async fn load_from_store(&self, host: &str) -> Result<Option<RobotsPolicy>, RobotsError> {
        let row: Option<(Option<String>, i32)> = sqlx::query_as(
            "SELECT robots_txt, crawl_delay FROM robots_cache \
             WHERE domain = $1 AND last_updated > now() - interval '24 hours'",
        )
        .bind(host)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(body, delay)| match body {
            Some(body) if !body.is_empty() => RobotsPolicy::parse(&self.user_agent, &body),
            _ => RobotsPolicy::permissive(delay.max(0) as u64),
        }))
    }

    async fn persist(
        &self,
        host: &str,
        body: Option<&str>,
        delay_secs: u64,
    ) -> Result<(), RobotsError> {
        sqlx::query(
            "INSERT INTO robots_cache (domain, robots_txt, last_updated, crawl_delay) \
             VALUES ($1, $2, now(), $3) \
             ON CONFLICT (domain) DO UPDATE SET \
                 robots_txt = EXCLUDED.robots_txt, \
                 last_updated = EXCLUDED.last_updated, \
                 crawl_delay = EXCLUDED.crawl_delay",
        )
        .bind(host)
        .bind(body)
        .bind(delay_secs as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_robots(&self, host: &str) -> FetchOutcome {
        let robots_url = format!("https://{}/robots.txt", host);
        debug!("Fetching {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() {
                    warn!("robots.txt fetch for {} returned {}", host, status);
                    FetchOutcome::Transient
                } else if status.as_u16() >= 400 {
                    FetchOutcome::Absent
                } else {
                    match response.text().await {
                        Ok(body) => FetchOutcome::Policy(body),
                        Err(_) => FetchOutcome::Transient,
                    }
                }
            }
            Err(e) if e.is_connect() => {
                // DNS failures and refused connections count as no robots
                FetchOutcome::Absent
            }
            Err(e) => {
                warn!("robots.txt fetch for {} failed: {}", host, e);
                FetchOutcome::Transient
            }
        }
    }
}
