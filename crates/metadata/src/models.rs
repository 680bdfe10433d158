//! Database models mapping to the metadata schema.

use gantry_core::{
    IndexStatus, InstanceIdentity, TagEntry, TagLevel, TagPath, TagStatus,
    ValueRepresentation, VersionedInstanceIdentity,
};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::MetadataResult;

// =============================================================================
// Extended tags
// =============================================================================

/// Input row for registering a tag; the store assigns the key.
#[derive(Debug, Clone)]
pub struct NewTagRow {
    pub path: String,
    pub vr: String,
    pub level: String,
}

impl NewTagRow {
    pub fn from_registration(registration: &gantry_core::TagRegistration) -> Self {
        Self {
            path: registration.path.as_str().to_string(),
            vr: registration.vr.code().to_string(),
            level: registration.level.as_str().to_string(),
        }
    }
}

/// Persisted extended tag record.
#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub key: i64,
    pub path: String,
    pub vr: String,
    pub level: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl TagRow {
    /// Convert to the domain entry, validating the stored codes.
    pub fn to_entry(&self) -> MetadataResult<TagEntry> {
        Ok(TagEntry {
            key: self.key,
            path: TagPath::parse(&self.path)?,
            vr: ValueRepresentation::parse(&self.vr)?,
            level: TagLevel::parse(&self.level)?,
            status: TagStatus::parse(&self.status)?,
        })
    }
}

// =============================================================================
// Instances
// =============================================================================

/// Stored instance record. `version` is the creation watermark, assigned
/// by the store and never reused.
#[derive(Debug, Clone, FromRow)]
pub struct InstanceRow {
    pub version: i64,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub index_status: String,
    pub created_at: OffsetDateTime,
}

impl InstanceRow {
    pub fn index_status(&self) -> MetadataResult<IndexStatus> {
        Ok(IndexStatus::parse(&self.index_status)?)
    }

    pub fn to_versioned_identity(&self) -> MetadataResult<VersionedInstanceIdentity> {
        let identity = InstanceIdentity::new(&self.study_uid, &self.series_uid, &self.sop_uid)?;
        Ok(VersionedInstanceIdentity::new(identity, self.version))
    }
}

// =============================================================================
// Typed index values
// =============================================================================

/// String-typed index row.
#[derive(Debug, Clone, FromRow)]
pub struct StringIndexRow {
    pub tag_key: i64,
    pub version: i64,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub value: String,
}

/// Integer-typed index row.
#[derive(Debug, Clone, FromRow)]
pub struct IntIndexRow {
    pub tag_key: i64,
    pub version: i64,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub value: i64,
}

/// Float-typed index row.
#[derive(Debug, Clone, FromRow)]
pub struct FloatIndexRow {
    pub tag_key: i64,
    pub version: i64,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub value: f64,
}

/// Timestamp-typed index row.
#[derive(Debug, Clone, FromRow)]
pub struct DateTimeIndexRow {
    pub tag_key: i64,
    pub version: i64,
    pub study_uid: String,
    pub series_uid: String,
    pub sop_uid: String,
    pub value: OffsetDateTime,
}

// =============================================================================
// Reindex jobs
// =============================================================================

/// Reindex (backfill) job record.
///
/// One job covers one registration batch. `cursor` is the page-boundary
/// checkpoint: the next walk resumes at `version <= cursor`.
#[derive(Debug, Clone, FromRow)]
pub struct ReindexJobRow {
    pub job_id: Uuid,
    pub state: String,
    /// JSON array of tag keys covered by this job.
    pub tag_keys: String,
    pub end_watermark: i64,
    pub cursor: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
}

impl ReindexJobRow {
    /// Decode the covered tag keys.
    pub fn tag_keys(&self) -> MetadataResult<Vec<i64>> {
        Ok(serde_json::from_str(&self.tag_keys)?)
    }

    /// Encode a tag key list for storage.
    pub fn encode_tag_keys(keys: &[i64]) -> MetadataResult<String> {
        Ok(serde_json::to_string(keys)?)
    }
}
