//! Watermark-driven historical backfill.

use crate::error::IndexingResult;
use crate::indexer::InstanceIndexer;
use gantry_core::{IndexStatus, ReindexConfig, TagEntry};
use gantry_metadata::{InstanceRepo, ReindexJobRepo, ReindexJobState};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Terminal outcome of one backfill walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexOutcome {
    /// Every eligible instance at or below the bound was indexed.
    Completed,
    /// The walk stopped at a page boundary; `resume_watermark` is the
    /// persisted checkpoint a later walk continues from.
    Cancelled { resume_watermark: i64 },
}

/// Reverse-paginated walk over historical instances.
///
/// The cursor strictly decreases with every non-empty page, so the walk
/// halts after finitely many pages. Instances created concurrently above
/// the original bound are covered by per-store indexing instead, never
/// reprocessed here.
pub struct ReindexWalker {
    instances: Arc<dyn InstanceRepo>,
    jobs: Arc<dyn ReindexJobRepo>,
    indexer: InstanceIndexer,
    config: ReindexConfig,
}

impl ReindexWalker {
    pub fn new(
        instances: Arc<dyn InstanceRepo>,
        jobs: Arc<dyn ReindexJobRepo>,
        indexer: InstanceIndexer,
        config: ReindexConfig,
    ) -> Self {
        Self {
            instances,
            jobs,
            indexer,
            config,
        }
    }

    /// Walk all `created` instances strictly below `upper_bound_exclusive`,
    /// newest first, indexing each for `tags` under the job `job_id`.
    pub async fn run(
        &self,
        tags: &[TagEntry],
        upper_bound_exclusive: i64,
        job_id: Uuid,
        cancel: &CancellationToken,
    ) -> IndexingResult<ReindexOutcome> {
        self.resume_from(tags, upper_bound_exclusive - 1, job_id, cancel)
            .await
    }

    /// Continue a walk whose next page is `version <= cursor`. Used both
    /// for fresh walks and for resuming an interrupted job from its
    /// persisted checkpoint; re-indexing the in-flight page is safe
    /// because index writes are idempotent.
    pub async fn resume_from(
        &self,
        tags: &[TagEntry],
        mut cursor: i64,
        job_id: Uuid,
        cancel: &CancellationToken,
    ) -> IndexingResult<ReindexOutcome> {
        loop {
            let page = self
                .instances
                .page_instances_below(cursor, self.config.page_size, IndexStatus::Created.as_str())
                .await?;

            if page.is_empty() {
                self.jobs
                    .update_reindex_state(
                        job_id,
                        ReindexJobState::Completed.as_str(),
                        Some(OffsetDateTime::now_utc()),
                    )
                    .await?;
                tracing::info!(job_id = %job_id, "backfill completed");
                return Ok(ReindexOutcome::Completed);
            }

            // The page arrives in descending version order; indexing in
            // that order bounds resumption loss to the in-flight page.
            for row in &page {
                let instance = row.to_versioned_identity()?;
                if let Err(e) = self.indexer.index_instance(tags, &instance).await {
                    if let Err(update_err) = self
                        .jobs
                        .update_reindex_state(
                            job_id,
                            ReindexJobState::Failed.as_str(),
                            Some(OffsetDateTime::now_utc()),
                        )
                        .await
                    {
                        tracing::error!(
                            job_id = %job_id,
                            error = %update_err,
                            "failed to mark reindex job as failed"
                        );
                    }
                    return Err(e);
                }
            }

            // page is non-empty and descending: the last row holds the
            // minimum version.
            let min_version = page[page.len() - 1].version;
            cursor = min_version - 1;
            self.jobs
                .update_reindex_cursor(job_id, cursor, OffsetDateTime::now_utc())
                .await?;

            // Cancellation is cooperative and observed at page
            // boundaries only; a page is never left half-checkpointed.
            if cancel.is_cancelled() {
                self.jobs
                    .update_reindex_state(job_id, ReindexJobState::Cancelled.as_str(), None)
                    .await?;
                tracing::info!(
                    job_id = %job_id,
                    resume_watermark = cursor,
                    "backfill cancelled at page boundary"
                );
                return Ok(ReindexOutcome::Cancelled {
                    resume_watermark: cursor,
                });
            }
        }
    }
}
