//! Batch ingestion with per-entry failure isolation.

use crate::entry::IngestionEntry;
use crate::error::StoreError;
use crate::response::{BatchResult, EntryOutcome, ResponseAggregator};
use crate::store::InstanceStore;
use futures::StreamExt;
use futures::stream;
use gantry_core::IngestConfig;
use std::sync::Arc;

/// Processes one submitted batch: every entry is stored independently
/// and the aggregate result reproduces submission order.
pub struct IngestionProcessor {
    store: Arc<dyn InstanceStore>,
    config: IngestConfig,
}

impl IngestionProcessor {
    pub fn new(store: Arc<dyn InstanceStore>, config: IngestConfig) -> Self {
        Self { store, config }
    }

    /// Process a batch.
    ///
    /// An empty batch returns `NoContent` immediately. Otherwise entries
    /// run concurrently up to the configured bound; one entry's failure
    /// never aborts the rest, and no storage call is retried here. When
    /// `required_study_uid` is given, entries belonging to any other
    /// study fail validation instead of being stored.
    pub async fn process<E: IngestionEntry>(
        &self,
        entries: &[E],
        required_study_uid: Option<&str>,
    ) -> BatchResult {
        if entries.is_empty() {
            return BatchResult::no_content();
        }

        let limit = self.config.max_parallel_entries.max(1);
        let resolved: Vec<(usize, EntryOutcome)> = stream::iter(
            entries.iter().enumerate().map(|(index, entry)| async move {
                (index, self.process_entry(entry, required_study_uid).await)
            }),
        )
        .buffer_unordered(limit)
        .collect()
        .await;

        let mut aggregator = ResponseAggregator::new();
        for (index, outcome) in resolved {
            aggregator.add(index, outcome);
        }
        aggregator.finalize()
    }

    /// Resolve one entry to its outcome. Never returns an error: any
    /// failure becomes a per-entry outcome instead of unwinding the
    /// batch.
    async fn process_entry<E: IngestionEntry>(
        &self,
        entry: &E,
        required_study_uid: Option<&str>,
    ) -> EntryOutcome {
        let dataset = match entry.dataset().await {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::warn!(error = %e, "entry dataset unreadable");
                return EntryOutcome::validation_failure(None);
            }
        };

        // Best-effort identity for failure reporting.
        let identity = dataset.identity().ok();

        if let Some(required) = required_study_uid {
            match dataset.study_uid() {
                Ok(study_uid) if study_uid == required => {}
                _ => {
                    tracing::warn!(
                        required_study_uid = required,
                        "entry does not belong to the required study"
                    );
                    return EntryOutcome::validation_failure(identity);
                }
            }
        }

        match self.store.store(&dataset).await {
            Ok(stored) => EntryOutcome::success(stored),
            Err(StoreError::Duplicate(msg)) => {
                tracing::debug!(reason = %msg, "entry is a duplicate");
                EntryOutcome::duplicate(identity)
            }
            Err(StoreError::InvalidDataset(e)) => {
                tracing::warn!(error = %e, "entry dataset failed validation");
                EntryOutcome::validation_failure(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "entry storage failed");
                EntryOutcome::processing_failure(identity)
            }
        }
    }
}
