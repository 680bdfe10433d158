//! Extended query tag types and lifecycle.

use crate::value::ValueRepresentation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical address of a DICOM attribute: group and element rendered as
/// eight uppercase hex digits (e.g. `00100020` for patient id).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagPath(String);

impl TagPath {
    /// Parse a path, normalizing to the canonical uppercase form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.len() != 8 {
            return Err(crate::Error::InvalidTagPath(format!(
                "tag path must be 8 hex digits, got {} chars",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::Error::InvalidTagPath(format!(
                "tag path contains non-hex characters: {s}"
            )));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Build a path from group and element numbers.
    pub fn from_parts(group: u16, element: u16) -> Self {
        Self(format!("{group:04X}{element:04X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The group number (first four hex digits).
    pub fn group(&self) -> u16 {
        // Canonical form is always valid hex.
        u16::from_str_radix(&self.0[..4], 16).unwrap_or(0)
    }

    /// The element number (last four hex digits).
    pub fn element(&self) -> u16 {
        u16::from_str_radix(&self.0[4..], 16).unwrap_or(0)
    }
}

impl fmt::Debug for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagPath({self})")
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource level an extended tag is indexed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagLevel {
    Study,
    Series,
    Instance,
}

impl TagLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Series => "series",
            Self::Instance => "instance",
        }
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "study" => Ok(Self::Study),
            "series" => Ok(Self::Series),
            "instance" => Ok(Self::Instance),
            other => Err(crate::Error::UnknownTagLevel(other.to_string())),
        }
    }
}

/// Lifecycle status of an extended tag.
///
/// A tag is created `Reindexing` and transitions exactly once to `Added`
/// when its historical backfill completes; it is never reverted. Readers
/// must exclude `Reindexing` tags from query filters: until the
/// transition, the tag's index is not guaranteed complete over
/// historical data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    /// Backfill over historical instances is pending or in flight.
    Reindexing,
    /// Backfill finished; the index covers all eligible instances.
    Added,
}

impl TagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reindexing => "reindexing",
            Self::Added => "added",
        }
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "reindexing" => Ok(Self::Reindexing),
            "added" => Ok(Self::Added),
            other => Err(crate::Error::UnknownTagStatus(other.to_string())),
        }
    }

    /// Whether query filters may rely on this tag's index.
    pub fn is_queryable(&self) -> bool {
        matches!(self, Self::Added)
    }
}

/// A request to register one extended tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRegistration {
    pub path: TagPath,
    pub vr: ValueRepresentation,
    pub level: TagLevel,
}

impl TagRegistration {
    pub fn new(path: TagPath, vr: ValueRepresentation, level: TagLevel) -> Self {
        Self { path, vr, level }
    }
}

/// An extended tag as persisted by the tag store.
///
/// `key` is assigned exactly once at persistence time and never reused;
/// `path` and `vr` are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub key: i64,
    pub path: TagPath,
    pub vr: ValueRepresentation,
    pub level: TagLevel,
    pub status: TagStatus,
}

impl fmt::Display for TagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {})",
            self.path,
            self.vr.code(),
            self.level.as_str(),
            self.status.as_str()
        )
    }
}
