//! Ingestion entry abstraction.

use crate::error::EntryError;
use async_trait::async_trait;
use gantry_core::AttributeSet;

/// One submitted object of a batch, yielding its dataset lazily.
///
/// The wire layer hands the processor opaque handles; the payload is
/// only parsed when the entry is processed, and that parse may fail.
#[async_trait]
pub trait IngestionEntry: Send + Sync {
    /// Retrieve the entry's attribute set.
    async fn dataset(&self) -> Result<AttributeSet, EntryError>;
}
