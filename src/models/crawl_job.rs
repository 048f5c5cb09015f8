use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle states of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested crawl: seed URL plus traversal bounds and progress counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrawlJob {
    pub id: Uuid,
    /// Seed URL the traversal starts from
    pub url: String,
    pub status: String,
    pub priority: i32,
    pub depth: i32,
    pub max_depth: i32,
    /// Allowed apex/suffix domains; empty means unrestricted
    pub domain_filter: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub pages_crawled: i32,
    pub pages_indexed: i32,
}

impl CrawlJob {
    pub fn status(&self) -> Option<JobStatus> {
        match self.status.as_str() {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status(),
            Some(JobStatus::Completed) | Some(JobStatus::Failed)
        )
    }
}
