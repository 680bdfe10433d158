//! Extended tag repository.

use crate::error::MetadataResult;
use crate::models::{NewTagRow, TagRow};
use async_trait::async_trait;

/// Repository for extended tag records.
#[async_trait]
pub trait TagRepo: Send + Sync {
    /// Persist a batch of new tags atomically with status `reindexing`.
    ///
    /// The store assigns each tag's key. If any path already exists the
    /// whole batch fails with `AlreadyExists` and nothing is persisted:
    /// a later backfill indexes all tags of the batch together, so a
    /// partial commit is never acceptable.
    async fn create_tags(&self, tags: &[NewTagRow]) -> MetadataResult<Vec<TagRow>>;

    /// Get a tag by key.
    async fn get_tag(&self, key: i64) -> MetadataResult<Option<TagRow>>;

    /// Get a tag by its canonical path.
    async fn get_tag_by_path(&self, path: &str) -> MetadataResult<Option<TagRow>>;

    /// Get tags by key, preserving the requested order.
    async fn get_tags_by_keys(&self, keys: &[i64]) -> MetadataResult<Vec<TagRow>>;

    /// List all tags, ordered by path.
    async fn list_tags(&self) -> MetadataResult<Vec<TagRow>>;

    /// Update a tag's lifecycle status.
    async fn update_tag_status(&self, key: i64, status: &str) -> MetadataResult<()>;
}
