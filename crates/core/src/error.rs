//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid tag path: {0}")]
    InvalidTagPath(String),

    #[error("invalid instance uid: {0}")]
    InvalidUid(String),

    #[error("dataset missing identity attribute: {0}")]
    MissingIdentity(String),

    #[error("unsupported attribute type: {code}")]
    UnsupportedAttributeType { code: String },

    #[error("attribute {path} does not hold a {expected} payload for VR {vr}")]
    MalformedAttribute {
        path: String,
        vr: String,
        expected: &'static str,
    },

    #[error("unknown tag level: {0}")]
    UnknownTagLevel(String),

    #[error("unknown tag status: {0}")]
    UnknownTagStatus(String),

    #[error("unknown index status: {0}")]
    UnknownIndexStatus(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
