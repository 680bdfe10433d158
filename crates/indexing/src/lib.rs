//! Extended query tag engine for Gantry.
//!
//! Tags registered after the fact are backfilled across historical
//! instances by walking the creation watermark in reverse, while new
//! instances are indexed at store time. This crate provides:
//! - Typed index value dispatch
//! - Per-instance attribute indexing
//! - The checkpoint-restartable backfill walk
//! - The tag registration lifecycle

pub mod error;
pub mod indexer;
pub mod registry;
pub mod reindex;
pub mod writer;

pub use error::{IndexingError, IndexingResult};
pub use indexer::InstanceIndexer;
pub use registry::TagRegistry;
pub use reindex::{ReindexOutcome, ReindexWalker};
pub use writer::IndexWriter;
