//! Typed extended-tag index value repository.

use crate::error::MetadataResult;
use crate::models::{DateTimeIndexRow, FloatIndexRow, IntIndexRow, StringIndexRow};
use async_trait::async_trait;
use gantry_core::VersionedInstanceIdentity;
use time::OffsetDateTime;

/// Repository for the four typed index tables.
///
/// Writes are idempotent upserts on (tag key, instance version): a
/// backfill walk and per-store indexing may race across the watermark
/// boundary and write the same pair twice, which must not error.
#[async_trait]
pub trait IndexValueRepo: Send + Sync {
    async fn insert_string_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: &str,
    ) -> MetadataResult<()>;

    async fn insert_int_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: i64,
    ) -> MetadataResult<()>;

    async fn insert_float_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: f64,
    ) -> MetadataResult<()>;

    async fn insert_datetime_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Read back all string index rows for a tag, ordered by version.
    async fn get_string_indexes(&self, tag_key: i64) -> MetadataResult<Vec<StringIndexRow>>;

    /// Read back all integer index rows for a tag, ordered by version.
    async fn get_int_indexes(&self, tag_key: i64) -> MetadataResult<Vec<IntIndexRow>>;

    /// Read back all float index rows for a tag, ordered by version.
    async fn get_float_indexes(&self, tag_key: i64) -> MetadataResult<Vec<FloatIndexRow>>;

    /// Read back all timestamp index rows for a tag, ordered by version.
    async fn get_datetime_indexes(&self, tag_key: i64) -> MetadataResult<Vec<DateTimeIndexRow>>;
}
