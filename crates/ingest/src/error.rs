//! Ingestion error types.

use thiserror::Error;

/// Failure yielding an entry's dataset.
#[derive(Debug, Error)]
#[error("failed to read entry dataset: {0}")]
pub struct EntryError(pub String);

/// Failure storing one instance.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The (study, series, instance) identity is already stored.
    #[error("duplicate instance: {0}")]
    Duplicate(String),

    /// The dataset is structurally unusable (identity missing or bad).
    #[error("invalid dataset: {0}")]
    InvalidDataset(#[from] gantry_core::Error),

    #[error("metadata error: {0}")]
    Metadata(gantry_metadata::MetadataError),

    #[error("indexing error: {0}")]
    Indexing(#[from] gantry_indexing::IndexingError),
}

impl From<gantry_metadata::MetadataError> for StoreError {
    fn from(e: gantry_metadata::MetadataError) -> Self {
        match e {
            gantry_metadata::MetadataError::AlreadyExists(msg) => StoreError::Duplicate(msg),
            other => StoreError::Metadata(other),
        }
    }
}
