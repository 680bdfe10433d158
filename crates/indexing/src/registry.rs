//! Extended tag registration and lifecycle.

use crate::error::{IndexingError, IndexingResult};
use crate::reindex::{ReindexOutcome, ReindexWalker};
use gantry_core::{TagEntry, TagRegistration, TagStatus};
use gantry_metadata::models::{NewTagRow, ReindexJobRow};
use gantry_metadata::{InstanceRepo, MetadataError, ReindexJobRepo, ReindexJobState, TagRepo};
use std::collections::HashSet;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Drives the tag lifecycle: registration, historical backfill, and the
/// one-way `reindexing` → `added` transition.
pub struct TagRegistry {
    tags: Arc<dyn TagRepo>,
    instances: Arc<dyn InstanceRepo>,
    jobs: Arc<dyn ReindexJobRepo>,
    walker: ReindexWalker,
}

impl TagRegistry {
    pub fn new(
        tags: Arc<dyn TagRepo>,
        instances: Arc<dyn InstanceRepo>,
        jobs: Arc<dyn ReindexJobRepo>,
        walker: ReindexWalker,
    ) -> Self {
        Self {
            tags,
            instances,
            jobs,
            walker,
        }
    }

    /// Register a batch of tags and backfill them over historical data.
    ///
    /// Registration is all-or-nothing: any path collision (against the
    /// store or within the batch itself) fails the whole call before a
    /// backfill starts. The entire batch shares a single walk; each tag
    /// transitions to `added` only once that walk completes. If the
    /// walk is cancelled the tags stay `reindexing` and the persisted
    /// job checkpoint feeds [`TagRegistry::resume_reindex`].
    pub async fn register_tags(
        &self,
        registrations: &[TagRegistration],
        cancel: &CancellationToken,
    ) -> IndexingResult<Vec<TagEntry>> {
        if registrations.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        for registration in registrations {
            if !seen.insert(registration.path.as_str()) {
                return Err(IndexingError::DuplicateTagPath(format!(
                    "tag path {} appears twice in one registration batch",
                    registration.path
                )));
            }
        }

        let new_rows: Vec<NewTagRow> = registrations
            .iter()
            .map(NewTagRow::from_registration)
            .collect();
        let rows = match self.tags.create_tags(&new_rows).await {
            Ok(rows) => rows,
            Err(MetadataError::AlreadyExists(msg)) => {
                return Err(IndexingError::DuplicateTagPath(msg));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(row.to_entry()?);
        }

        let Some(latest) = self.instances.latest_instance_version().await? else {
            // Empty store: nothing to backfill, the tags are complete
            // by definition.
            self.mark_added(&mut entries).await?;
            return Ok(entries);
        };

        let job_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let keys: Vec<i64> = entries.iter().map(|e| e.key).collect();
        let job = ReindexJobRow {
            job_id,
            state: ReindexJobState::Running.as_str().to_string(),
            tag_keys: ReindexJobRow::encode_tag_keys(&keys)?,
            end_watermark: latest + 1,
            cursor: latest,
            created_at: now,
            updated_at: now,
            finished_at: None,
        };
        self.jobs.create_reindex_job(&job).await?;

        tracing::info!(
            job_id = %job_id,
            tags = entries.len(),
            end_watermark = latest + 1,
            "starting backfill for newly registered tags"
        );

        if let ReindexOutcome::Completed =
            self.walker.run(&entries, latest + 1, job_id, cancel).await?
        {
            self.mark_added(&mut entries).await?;
        }

        Ok(entries)
    }

    /// Resume an interrupted backfill job from its persisted checkpoint.
    ///
    /// On completion the job's tags transition to `added` exactly as if
    /// the original walk had finished.
    pub async fn resume_reindex(
        &self,
        job_id: Uuid,
        cancel: &CancellationToken,
    ) -> IndexingResult<ReindexOutcome> {
        let job = self
            .jobs
            .get_reindex_job(job_id)
            .await?
            .ok_or(IndexingError::JobNotFound(job_id))?;

        if job.state == ReindexJobState::Completed.as_str()
            || job.state == ReindexJobState::Failed.as_str()
        {
            return Err(IndexingError::JobAlreadyFinished {
                job_id,
                state: job.state,
            });
        }

        let keys = job.tag_keys()?;
        let rows = self.tags.get_tags_by_keys(&keys).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(row.to_entry()?);
        }

        self.jobs
            .update_reindex_state(job_id, ReindexJobState::Running.as_str(), None)
            .await?;
        tracing::info!(
            job_id = %job_id,
            cursor = job.cursor,
            "resuming backfill from checkpoint"
        );

        let outcome = self
            .walker
            .resume_from(&entries, job.cursor, job_id, cancel)
            .await?;
        if let ReindexOutcome::Completed = outcome {
            self.mark_added(&mut entries).await?;
        }
        Ok(outcome)
    }

    async fn mark_added(&self, entries: &mut [TagEntry]) -> IndexingResult<()> {
        for entry in entries.iter_mut() {
            self.tags
                .update_tag_status(entry.key, TagStatus::Added.as_str())
                .await?;
            entry.status = TagStatus::Added;
        }
        Ok(())
    }
}
