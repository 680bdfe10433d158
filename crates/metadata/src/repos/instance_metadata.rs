//! Instance attribute-set persistence.

use crate::error::MetadataResult;
use async_trait::async_trait;
use gantry_core::AttributeSet;

/// Repository for the full attribute metadata of stored instances.
///
/// The attribute set is what per-instance indexing scans; it is written
/// once at store time and read back by backfill walks.
#[async_trait]
pub trait InstanceMetadataRepo: Send + Sync {
    /// Persist the attribute set for an instance version.
    async fn put_instance_metadata(
        &self,
        version: i64,
        attributes: &AttributeSet,
    ) -> MetadataResult<()>;

    /// Fetch the attribute set for an instance version.
    ///
    /// Fails with `NotFound` if no metadata was stored for the version.
    async fn get_instance_metadata(&self, version: i64) -> MetadataResult<AttributeSet>;
}
