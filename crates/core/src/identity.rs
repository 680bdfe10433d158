//! Instance identity and watermark types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a DICOM unique identifier.
const MAX_UID_LEN: usize = 64;

/// Validate a DICOM UID component (digits and dots, bounded length).
fn validate_uid(uid: &str) -> crate::Result<()> {
    if uid.is_empty() {
        return Err(crate::Error::InvalidUid("uid cannot be empty".to_string()));
    }
    if uid.len() > MAX_UID_LEN {
        return Err(crate::Error::InvalidUid(format!(
            "uid exceeds {MAX_UID_LEN} chars: {}",
            uid.len()
        )));
    }
    for c in uid.chars() {
        if !matches!(c, '0'..='9' | '.') {
            return Err(crate::Error::InvalidUid(format!(
                "invalid character in uid: {c}"
            )));
        }
    }
    Ok(())
}

/// Identity of a single imaging instance: the (study, series, instance)
/// UID triple.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceIdentity {
    study_uid: String,
    series_uid: String,
    sop_uid: String,
}

impl InstanceIdentity {
    /// Create an identity, validating each UID component.
    pub fn new(
        study_uid: impl Into<String>,
        series_uid: impl Into<String>,
        sop_uid: impl Into<String>,
    ) -> crate::Result<Self> {
        let study_uid = study_uid.into();
        let series_uid = series_uid.into();
        let sop_uid = sop_uid.into();
        validate_uid(&study_uid)?;
        validate_uid(&series_uid)?;
        validate_uid(&sop_uid)?;
        Ok(Self {
            study_uid,
            series_uid,
            sop_uid,
        })
    }

    pub fn study_uid(&self) -> &str {
        &self.study_uid
    }

    pub fn series_uid(&self) -> &str {
        &self.series_uid
    }

    pub fn sop_uid(&self) -> &str {
        &self.sop_uid
    }
}

impl fmt::Debug for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceIdentity({self})")
    }
}

impl fmt::Display for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.study_uid, self.series_uid, self.sop_uid)
    }
}

/// An instance identity together with the watermark assigned at creation.
///
/// The version is globally unique and strictly increasing across the
/// store; it totally orders instances and is never reused after deletion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedInstanceIdentity {
    pub identity: InstanceIdentity,
    pub version: i64,
}

impl VersionedInstanceIdentity {
    pub fn new(identity: InstanceIdentity, version: i64) -> Self {
        Self { identity, version }
    }
}

impl fmt::Display for VersionedInstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identity, self.version)
    }
}

/// Indexing lifecycle of a stored instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// Instance row exists but its metadata is still being written.
    Creating,
    /// Instance is fully stored and eligible for backfill indexing.
    Created,
    /// Instance was deleted; its version is retired, never reassigned.
    Deleted,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "creating" => Ok(Self::Creating),
            "created" => Ok(Self::Created),
            "deleted" => Ok(Self::Deleted),
            other => Err(crate::Error::UnknownIndexStatus(other.to_string())),
        }
    }

    /// Only fully created instances are visible to backfill walks.
    pub fn is_indexable(&self) -> bool {
        matches!(self, Self::Created)
    }
}
