use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a scraping job: pending -> running -> completed | failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job in this state may move to `next`.
    ///
    /// A pending job may fail directly when its source cannot be started.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal()
            && matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

/// One run of one source (`scraping_jobs`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingJob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source_id: String,
    pub status: JobStatus,
    pub properties_found: u32,
    pub properties_saved: u32,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapingJob {
    pub fn pending(source_id: &str) -> Self {
        Self {
            id: None,
            source_id: source_id.to_string(),
            status: JobStatus::Pending,
            properties_found: 0,
            properties_saved: 0,
            error_message: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// How a data source is fetched and split into listings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Website,
    Rss,
    /// Public channel preview at `https://t.me/s/<channel>`
    TelegramChannel,
}

/// Configured listing source (`data_sources`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub source_type: SourceType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional CSS selector overrides, see `ListingSelectors`
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub last_scraped_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}
