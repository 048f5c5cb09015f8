use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum claim attempts before a frontier entry is abandoned
pub const MAX_ATTEMPTS: i32 = 3;

/// Lifecycle states of a frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl UrlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlStatus::Pending => "pending",
            UrlStatus::Processing => "processing",
            UrlStatus::Completed => "completed",
            UrlStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frontier entry: one URL known-to-crawl with its scheduling state
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UrlRecord {
    pub id: Uuid,
    /// Normalized URL, unique across the frontier
    pub url: String,
    pub parent_url: Option<String>,
    pub depth: i32,
    /// Larger priority is claimed sooner
    pub priority: i32,
    pub job_id: Option<Uuid>,
    pub status: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    /// Earliest time this entry is eligible for claiming
    pub scheduled_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl UrlRecord {
    pub fn status(&self) -> Option<UrlStatus> {
        match self.status.as_str() {
            "pending" => Some(UrlStatus::Pending),
            "processing" => Some(UrlStatus::Processing),
            "completed" => Some(UrlStatus::Completed),
            "failed" => Some(UrlStatus::Failed),
            _ => None,
        }
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }
}
