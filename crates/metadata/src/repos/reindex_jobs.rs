//! Reindex job repository.

use crate::error::MetadataResult;
use crate::models::ReindexJobRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for backfill job bookkeeping.
#[async_trait]
pub trait ReindexJobRepo: Send + Sync {
    /// Create a reindex job.
    async fn create_reindex_job(&self, job: &ReindexJobRow) -> MetadataResult<()>;

    /// Get a reindex job by ID.
    async fn get_reindex_job(&self, job_id: Uuid) -> MetadataResult<Option<ReindexJobRow>>;

    /// Persist the page-boundary cursor checkpoint for a running job.
    async fn update_reindex_cursor(
        &self,
        job_id: Uuid,
        cursor: i64,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Move a job to a terminal or paused state.
    async fn update_reindex_state(
        &self,
        job_id: Uuid,
        state: &str,
        finished_at: Option<OffsetDateTime>,
    ) -> MetadataResult<()>;

    /// Jobs that are not finished (running or cancelled mid-walk).
    /// These need recovery after a process restart: their tags are
    /// still `reindexing` and their cursor is the resumption point.
    async fn unfinished_reindex_jobs(&self) -> MetadataResult<Vec<ReindexJobRow>>;
}

/// Reindex job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexJobState {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ReindexJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
