//! The crawl worker: a bounded pool of crawl handlers fed by a frontier
//! pump, composed from explicitly constructed collaborators.

mod tests;

use crate::config::CrawlerConfig;
use crate::extractor::ContentExtractor;
use crate::fetcher::{FetchError, PageFetcher};
use crate::frontier::{CrawlOutcome, Frontier, FrontierError};
use crate::models::{document_id, IndexedDocument};
use crate::queue::{ActiveJob, CrawlPageJob, JobOptions, JobQueue, QueueError};
use crate::ratelimit::RateLimiter;
use crate::robots::RobotsCache;
use crate::search::{DocumentSink, SearchError};
use crate::storage::pages::PageUpsert;
use crate::storage::{DatabasePool, JobRepository, PageRepository, StorageError};
use crate::urls::{host_of, should_crawl_domain};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Delay applied by `reschedule_failed` sweeps
const RESCHEDULE_DELAY_MINUTES: i64 = 60;

/// Age after which a processing claim is considered orphaned
const STALLED_CLAIM_MINUTES: i64 = 10;

/// Pump ticks between maintenance sweeps (~60 s at the default tick)
const MAINTENANCE_EVERY_TICKS: u64 = 12;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("Content extraction failed")]
    ExtractionFailed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] FrontierError),

    #[error("Index error: {0}")]
    Index(#[from] SearchError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Successful outcomes of the crawl procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlSuccess {
    /// Page fetched, persisted and indexed
    Indexed,
    /// Fresh within the recency window; nothing fetched
    Skipped,
    /// Robots policy forbids this URL
    Disallowed,
}

/// How a finished job is reported back to the queue and frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Disposition {
    Complete,
    /// Terminal for the URL; the queue must not retry
    PolicyFailure(String),
    /// Re-thrown to the queue so its retry/backoff policy engages
    RetryableFailure(String),
}

/// Classify a crawl result per the failure taxonomy: policy rejections,
/// client errors and parse failures are terminal; transient network and
/// infrastructure errors retry.
pub(crate) fn disposition_for(result: &Result<CrawlSuccess, CrawlError>) -> Disposition {
    match result {
        Ok(CrawlSuccess::Indexed) | Ok(CrawlSuccess::Skipped) => Disposition::Complete,
        Ok(CrawlSuccess::Disallowed) => {
            Disposition::PolicyFailure("Disallowed by robots.txt".to_string())
        }
        Err(CrawlError::ExtractionFailed) => {
            Disposition::PolicyFailure("Content extraction failed".to_string())
        }
        Err(CrawlError::Fetch(e)) => match e {
            FetchError::UnsupportedContentType(_)
            | FetchError::ContentTooLarge { .. }
            | FetchError::InvalidUrl(_) => Disposition::PolicyFailure(e.to_string()),
            FetchError::Http { status, .. } if *status < 500 => {
                Disposition::PolicyFailure(e.to_string())
            }
            _ => Disposition::RetryableFailure(e.to_string()),
        },
        Err(e) => Disposition::RetryableFailure(e.to_string()),
    }
}

pub struct Worker {
    config: CrawlerConfig,
    frontier: Frontier,
    robots: RobotsCache,
    limiter: RateLimiter,
    fetcher: PageFetcher,
    extractor: ContentExtractor,
    pages: PageRepository,
    jobs: JobRepository,
    queue: Arc<dyn JobQueue>,
    sink: Arc<dyn DocumentSink>,
    is_shutting_down: AtomicBool,
}

impl Worker {
    pub async fn new(
        config: CrawlerConfig,
        pool: DatabasePool,
        queue: Arc<dyn JobQueue>,
        sink: Arc<dyn DocumentSink>,
    ) -> crate::Result<Self> {
        let frontier = Frontier::new(pool.clone());
        let robots = RobotsCache::new(
            pool.clone(),
            config.crawler.user_agent.clone(),
            config.politeness.respect_robots_txt,
        );
        let limiter = RateLimiter::connect(&config.storage.redis_url, config.default_delay()).await;
        let fetcher = PageFetcher::new(&config)?;

        Ok(Self {
            frontier,
            robots,
            limiter,
            fetcher,
            extractor: ContentExtractor::new(),
            pages: PageRepository::new(pool.clone()),
            jobs: JobRepository::new(pool),
            queue,
            sink,
            is_shutting_down: AtomicBool::new(false),
            config,
        })
    }

    /// Run the pump and crawl handlers until a termination signal arrives,
    /// then drain within the grace window.
    pub async fn run(self: Arc<Self>) -> crate::Result<()> {
        info!(
            "Starting worker: {} handlers, pump every {} ms",
            self.config.crawler.max_concurrent, self.config.crawler.pump_interval_ms
        );

        let mut join_set = JoinSet::new();

        {
            let worker = self.clone();
            join_set.spawn(async move { worker.frontier_pump().await });
        }
        for handler_id in 0..self.config.crawler.max_concurrent {
            let worker = self.clone();
            join_set.spawn(async move { worker.crawl_handler(handler_id).await });
        }

        tokio::signal::ctrl_c().await?;
        info!("Termination signal received; shutting down");
        self.is_shutting_down.store(true, Ordering::SeqCst);

        let drain = async {
            while join_set.join_next().await.is_some() {}
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Shutdown grace window expired; aborting active handlers");
            join_set.abort_all();
        }

        if let Err(e) = self.queue.close().await {
            warn!("Failed to close job queue: {}", e);
        }
        self.fetcher.shutdown().await;

        info!("Worker stopped");
        Ok(())
    }

    fn shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Claim eligible frontier records and dispatch them as jobs. Runs
    /// recovery sweeps on a slower sub-cadence.
    async fn frontier_pump(&self) {
        info!("Frontier pump started");
        let base_interval = Duration::from_millis(self.config.crawler.pump_interval_ms);
        let mut tick: u64 = 0;

        while !self.shutting_down() {
            tick += 1;
            match self.pump_once(tick).await {
                Ok(dispatched) => {
                    if dispatched > 0 {
                        debug!("Dispatched {} frontier records", dispatched);
                    }
                    tokio::time::sleep(base_interval).await;
                }
                Err(e) => {
                    warn!("Frontier pump error: {}", e);
                    tokio::time::sleep(base_interval * 2).await;
                }
            }
        }
        info!("Frontier pump stopped");
    }

    async fn pump_once(&self, tick: u64) -> Result<usize, CrawlError> {
        if tick % MAINTENANCE_EVERY_TICKS == 0 {
            self.frontier
                .reschedule_failed(ChronoDuration::minutes(RESCHEDULE_DELAY_MINUTES))
                .await?;
            self.frontier
                .release_stalled(ChronoDuration::minutes(STALLED_CLAIM_MINUTES))
                .await?;
            self.queue.recover_stalled().await?;
        }

        let records = self
            .frontier
            .claim_batch(self.config.crawler.claim_batch_size as i64)
            .await?;

        let mut dispatched = 0;
        for record in records {
            let payload = CrawlPageJob {
                record_id: record.id,
                url: record.url.clone(),
                depth: record.depth,
                job_id: record.job_id,
            };
            let opts = JobOptions {
                priority: record.priority,
                ..JobOptions::default()
            };
            match self.queue.enqueue(payload, opts).await {
                Ok(_) => dispatched += 1,
                // The record stays in processing; the stalled-claim sweep
                // returns it to pending if dispatch keeps failing
                Err(e) => warn!("Failed to dispatch {}: {}", record.url, e),
            }
        }
        Ok(dispatched)
    }

    async fn crawl_handler(&self, handler_id: usize) {
        info!("Crawl handler {} started", handler_id);

        while !self.shutting_down() {
            match self.queue.next().await {
                Ok(Some(job)) => self.handle_job(job).await,
                Ok(None) => tokio::time::sleep(Duration::from_millis(500)).await,
                Err(e) => {
                    warn!("Handler {} failed to poll queue: {}", handler_id, e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        info!("Crawl handler {} stopped", handler_id);
    }

    async fn handle_job(&self, job: ActiveJob) {
        let result = self.crawl_page(&job.payload).await;
        let disposition = disposition_for(&result);
        let record_id = job.payload.record_id;
        let url = &job.payload.url;

        match disposition {
            Disposition::Complete => {
                if let Err(e) = self.queue.complete(&job).await {
                    warn!("Failed to ack job for {}: {}", url, e);
                }
                self.finish_record(record_id, CrawlOutcome::Completed, None)
                    .await;
            }
            Disposition::PolicyFailure(reason) => {
                debug!("Terminal failure for {}: {}", url, reason);
                // Not retried: ack the job, fail the URL
                if let Err(e) = self.queue.complete(&job).await {
                    warn!("Failed to ack job for {}: {}", url, e);
                }
                self.finish_record(record_id, CrawlOutcome::Failed, Some(&reason))
                    .await;
                self.record_job_failure(job.payload.job_id, &reason).await;
            }
            Disposition::RetryableFailure(reason) => {
                error!("Crawl of {} failed: {}", url, reason);
                if let Err(e) = self.queue.fail(&job, &reason).await {
                    warn!("Failed to requeue job for {}: {}", url, e);
                }
                self.finish_record(record_id, CrawlOutcome::Failed, Some(&reason))
                    .await;
                self.record_job_failure(job.payload.job_id, &reason).await;
            }
        }

        if let Some(job_id) = job.payload.job_id {
            if let Err(e) = self.jobs.try_finish(job_id).await {
                warn!("Failed to check crawl job {} for completion: {}", job_id, e);
            }
        }
    }

    async fn finish_record(&self, id: Uuid, outcome: CrawlOutcome, error: Option<&str>) {
        if let Err(e) = self.frontier.complete(id, outcome, error).await {
            warn!("Failed to finalize frontier record {}: {}", id, e);
        }
    }

    async fn record_job_failure(&self, job_id: Option<Uuid>, reason: &str) {
        if let Some(job_id) = job_id {
            if let Err(e) = self.jobs.record_failure(job_id, reason).await {
                warn!("Failed to record failure on crawl job {}: {}", job_id, e);
            }
        }
    }

    /// The crawl procedure for one URL: recency check, politeness, fetch,
    /// extract, persist, index, frontier expansion, progress reporting.
    async fn crawl_page(&self, payload: &CrawlPageJob) -> Result<CrawlSuccess, CrawlError> {
        let url = &payload.url;

        // Traversal bounds come from the owning crawl job when there is one
        let job = match payload.job_id {
            Some(job_id) => self.jobs.find(job_id).await?,
            None => None,
        };
        let max_depth = job
            .as_ref()
            .map(|j| j.max_depth)
            .unwrap_or(self.config.crawler.max_depth as i32);
        let domain_filter: &[String] = job.as_ref().map(|j| j.domain_filter.as_slice()).unwrap_or(&[]);
        let priority = job.as_ref().map(|j| j.priority).unwrap_or(5);

        if let Some(job) = &job {
            self.jobs.mark_started(job.id).await?;
        }

        // 1. Recency: a fresh page is not re-fetched
        if let Some(page) = self.pages.find_by_url(url).await? {
            if page.is_fresh(Utc::now(), self.config.crawler.recrawl_window_hours) {
                debug!("Skipping {} (crawled recently)", url);
                return Ok(CrawlSuccess::Skipped);
            }
        }

        // 2. Robots
        let permission = self.robots.can_crawl(url).await;
        if !permission.allowed {
            return Ok(CrawlSuccess::Disallowed);
        }

        // 3. Rate limit
        let host = host_of(url).unwrap_or_else(|| "unknown".to_string());
        self.limiter
            .set_delay(&host, permission.delay_secs * 1000)
            .await;
        self.limiter.wait(&host).await;

        // 4. Fetch
        let fetched = self.fetcher.fetch(url).await?;

        // 5. Extract
        let extracted = self
            .extractor
            .extract(&fetched.body, &fetched.content_type, url)
            .ok_or(CrawlError::ExtractionFailed)?;

        // 6. Persist
        self.pages
            .upsert(&PageUpsert {
                url: url.clone(),
                title: extracted.title.clone(),
                content_hash: extracted.content_hash.clone(),
                last_modified: fetched.last_modified,
                status_code: fetched.status_code as i32,
                content_type: fetched.content_type.clone(),
                word_count: extracted.word_count as i32,
                domain: host.clone(),
            })
            .await?;

        // 7. Index
        let document = IndexedDocument {
            id: document_id(url),
            url: url.clone(),
            title: extracted.title.clone(),
            description: extracted.description.clone(),
            content: extracted.content.clone(),
            keywords: extracted.keywords.clone(),
            domain: host,
            crawl_date: Utc::now(),
            last_modified: fetched.last_modified,
            content_type: fetched.content_type.clone(),
            language: extracted.language.clone(),
            word_count: extracted.word_count,
            content_hash: extracted.content_hash.clone(),
            links: extracted.links.clone(),
            metadata: extracted.metadata.clone(),
        };
        self.sink.index(document).await?;

        // 8. Frontier expansion
        let mut links_enqueued = 0usize;
        if payload.depth < max_depth {
            for link in &extracted.links {
                if !should_crawl_domain(&link.url, domain_filter) {
                    continue;
                }
                // Session-local fast reject before touching the store
                if self.frontier.recently_enqueued(&link.url) {
                    continue;
                }
                if self.pages.url_exists(&link.url).await? {
                    continue;
                }
                let outcome = self
                    .frontier
                    .enqueue(
                        &link.url,
                        Some(url),
                        payload.depth + 1,
                        priority,
                        payload.job_id,
                    )
                    .await?;
                if outcome == crate::frontier::EnqueueOutcome::Added {
                    links_enqueued += 1;
                }
            }
        }

        // 9. Progress
        if let Some(job_id) = payload.job_id {
            self.jobs.record_progress(job_id, 1, 1).await?;
        }

        info!(
            "Crawled {} ({} words, {} new links)",
            url, extracted.word_count, links_enqueued
        );
        Ok(CrawlSuccess::Indexed)
    }
}
