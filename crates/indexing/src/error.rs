//! Indexing engine error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors from the extended-tag indexing engine.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// A registration collided with an existing tag path (or another
    /// path in the same batch). Registration is all-or-nothing: no tag
    /// of the batch was persisted.
    #[error("duplicate tag path: {0}")]
    DuplicateTagPath(String),

    #[error("reindex job {0} not found")]
    JobNotFound(Uuid),

    #[error("reindex job {job_id} already finished as {state}")]
    JobAlreadyFinished { job_id: Uuid, state: String },

    #[error("metadata error: {0}")]
    Metadata(#[from] gantry_metadata::MetadataError),

    #[error("domain error: {0}")]
    Domain(#[from] gantry_core::Error),
}

/// Result type for indexing operations.
pub type IndexingResult<T> = std::result::Result<T, IndexingError>;
