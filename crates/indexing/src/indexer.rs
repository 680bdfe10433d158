//! Per-instance extended-tag indexing.

use crate::error::{IndexingError, IndexingResult};
use crate::writer::IndexWriter;
use gantry_core::{Attribute, TagEntry, VersionedInstanceIdentity, extract};
use gantry_metadata::InstanceMetadataRepo;
use std::sync::Arc;

/// Indexes one instance's attributes for a set of extended tags.
pub struct InstanceIndexer {
    metadata: Arc<dyn InstanceMetadataRepo>,
    writer: IndexWriter,
}

impl InstanceIndexer {
    pub fn new(metadata: Arc<dyn InstanceMetadataRepo>, writer: IndexWriter) -> Self {
        Self { metadata, writer }
    }

    /// Index every tag of `tags` that this instance carries an
    /// attribute for. Tags with no matching attribute are skipped;
    /// most instances lack most optional attributes.
    ///
    /// Failures are isolated per attribute: an attribute whose value
    /// cannot be extracted (unsupported or mislabeled VR) is logged and
    /// skipped without touching the index, and a store failure on one
    /// tag does not suppress the writes for the remaining tags. The
    /// first store failure is returned after all tags were attempted.
    pub async fn index_instance(
        &self,
        tags: &[TagEntry],
        instance: &VersionedInstanceIdentity,
    ) -> IndexingResult<()> {
        let attributes = self.metadata.get_instance_metadata(instance.version).await?;

        let mut matched: Vec<(&TagEntry, &Attribute)> = Vec::new();
        for tag in tags {
            if let Some(attribute) = attributes.find(&tag.path) {
                matched.push((tag, attribute));
            }
        }

        let mut first_failure: Option<IndexingError> = None;
        for (tag, attribute) in matched {
            let value = match extract(&attribute.vr, attribute) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(
                        tag_key = tag.key,
                        path = %tag.path,
                        instance = %instance,
                        error = %e,
                        "skipping attribute: value not extractable"
                    );
                    continue;
                }
            };

            if let Err(e) = self.writer.write(tag.key, instance, &value).await {
                tracing::warn!(
                    tag_key = tag.key,
                    instance = %instance,
                    error = %e,
                    "index write failed"
                );
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
