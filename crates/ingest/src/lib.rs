//! Batch ingestion pipeline for Gantry.
//!
//! Entries of one batch are stored independently (a failed entry never
//! aborts its neighbors) and the per-batch result reproduces submission
//! order no matter how the entries were scheduled. This
//! crate provides:
//! - The ingestion entry abstraction
//! - The instance store collaborator and its metadata-backed
//!   implementation
//! - Per-batch outcome aggregation and the derived batch status
//! - The bounded-concurrency batch processor

pub mod entry;
pub mod error;
pub mod processor;
pub mod response;
pub mod store;

pub use entry::IngestionEntry;
pub use error::{EntryError, StoreError};
pub use processor::IngestionProcessor;
pub use response::{
    BatchResult, BatchStatus, EntryOutcome, OutcomeKind, ResponseAggregator,
    DUPLICATE_SOP_INSTANCE, PROCESSING_FAILURE, VALIDATION_FAILURE,
};
pub use store::{InstanceStore, MetadataInstanceStore};
