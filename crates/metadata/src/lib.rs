//! Metadata store abstraction and implementations for Gantry.
//!
//! This crate provides the control-plane data model:
//! - Extended tag records and lifecycle status
//! - Instance records and creation watermarks
//! - Per-instance attribute metadata
//! - Typed extended-tag index values
//! - Reindex (backfill) job state

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::{
    IndexValueRepo, InstanceMetadataRepo, InstanceRepo, ReindexJobRepo, ReindexJobState, TagRepo,
};
pub use store::{MetadataStore, SqliteStore};

use std::path::Path;
use std::sync::Arc;

/// Open a SQLite-backed metadata store at the given path.
pub async fn from_path(path: impl AsRef<Path>) -> MetadataResult<Arc<dyn MetadataStore>> {
    let store = SqliteStore::new(path).await?;
    Ok(Arc::new(store) as Arc<dyn MetadataStore>)
}
