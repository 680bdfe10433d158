//! Typed index value dispatch.

use crate::error::IndexingResult;
use gantry_core::{TagValue, VersionedInstanceIdentity};
use gantry_metadata::IndexValueRepo;
use std::sync::Arc;

/// Dispatches an extracted scalar to the correctly-typed index table.
pub struct IndexWriter {
    index_store: Arc<dyn IndexValueRepo>,
}

impl IndexWriter {
    pub fn new(index_store: Arc<dyn IndexValueRepo>) -> Self {
        Self { index_store }
    }

    /// Write one index value: exactly one store call per
    /// (tag key, instance) pair. The match is exhaustive over the
    /// scalar shapes, so an index table cannot be skipped silently.
    pub async fn write(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: &TagValue,
    ) -> IndexingResult<()> {
        match value {
            TagValue::Str(v) => {
                self.index_store
                    .insert_string_index(tag_key, instance, v)
                    .await?
            }
            TagValue::Int(v) => {
                self.index_store
                    .insert_int_index(tag_key, instance, *v)
                    .await?
            }
            TagValue::Float(v) => {
                self.index_store
                    .insert_float_index(tag_key, instance, *v)
                    .await?
            }
            TagValue::DateTime(v) => {
                self.index_store
                    .insert_datetime_index(tag_key, instance, *v)
                    .await?
            }
        }
        Ok(())
    }
}
