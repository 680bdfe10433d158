//! Instance repository.

use crate::error::MetadataResult;
use crate::models::InstanceRow;
use async_trait::async_trait;
use gantry_core::InstanceIdentity;
use time::OffsetDateTime;

/// Repository for stored instance records and their watermarks.
#[async_trait]
pub trait InstanceRepo: Send + Sync {
    /// Create an instance row in status `creating` and return its
    /// store-assigned version. The version sequence is strictly
    /// increasing and never reuses a retired value. A duplicate
    /// (study, series, instance) identity fails with `AlreadyExists`.
    async fn create_instance(
        &self,
        identity: &InstanceIdentity,
        created_at: OffsetDateTime,
    ) -> MetadataResult<i64>;

    /// Get an instance by version.
    async fn get_instance(&self, version: i64) -> MetadataResult<Option<InstanceRow>>;

    /// Transition an instance's index status.
    async fn update_index_status(&self, version: i64, index_status: &str) -> MetadataResult<()>;

    /// The highest version assigned so far, if any instance exists.
    async fn latest_instance_version(&self) -> MetadataResult<Option<i64>>;

    /// Fetch up to `page_size` instances with `version <= watermark` in
    /// the given index status, ordered by version descending.
    async fn page_instances_below(
        &self,
        watermark: i64,
        page_size: u32,
        index_status: &str,
    ) -> MetadataResult<Vec<InstanceRow>>;
}
