//! Instance storage collaborator.

use crate::error::StoreError;
use async_trait::async_trait;
use gantry_core::{AttributeSet, IndexStatus, TagEntry, VersionedInstanceIdentity};
use gantry_indexing::InstanceIndexer;
use gantry_metadata::{InstanceMetadataRepo, InstanceRepo, TagRepo};
use std::sync::Arc;
use time::OffsetDateTime;

/// Persists one instance and reports how it resolved.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Store a dataset, returning the identity plus the watermark the
    /// store assigned. A previously stored identity fails with
    /// [`StoreError::Duplicate`].
    async fn store(&self, dataset: &AttributeSet)
    -> Result<VersionedInstanceIdentity, StoreError>;
}

/// Metadata-backed instance store.
///
/// Store order: create the instance row (`creating`), persist the
/// attribute metadata, index every currently registered tag, then flip
/// the row to `created`. Tags still in `reindexing` are indexed here
/// too: their backfill walk only covers versions below its watermark,
/// and the index upserts make the overlap at the boundary harmless.
pub struct MetadataInstanceStore {
    instances: Arc<dyn InstanceRepo>,
    metadata: Arc<dyn InstanceMetadataRepo>,
    tags: Arc<dyn TagRepo>,
    indexer: InstanceIndexer,
}

impl MetadataInstanceStore {
    pub fn new(
        instances: Arc<dyn InstanceRepo>,
        metadata: Arc<dyn InstanceMetadataRepo>,
        tags: Arc<dyn TagRepo>,
        indexer: InstanceIndexer,
    ) -> Self {
        Self {
            instances,
            metadata,
            tags,
            indexer,
        }
    }

    async fn registered_tags(&self) -> Result<Vec<TagEntry>, StoreError> {
        let rows = self.tags.list_tags().await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(row.to_entry()?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl InstanceStore for MetadataInstanceStore {
    async fn store(
        &self,
        dataset: &AttributeSet,
    ) -> Result<VersionedInstanceIdentity, StoreError> {
        let identity = dataset.identity()?;
        let version = self
            .instances
            .create_instance(&identity, OffsetDateTime::now_utc())
            .await?;
        let stored = VersionedInstanceIdentity::new(identity, version);

        self.metadata.put_instance_metadata(version, dataset).await?;

        let tags = self.registered_tags().await?;
        if !tags.is_empty() {
            self.indexer.index_instance(&tags, &stored).await?;
        }

        self.instances
            .update_index_status(version, IndexStatus::Created.as_str())
            .await?;

        tracing::debug!(instance = %stored, "instance stored");
        Ok(stored)
    }
}
