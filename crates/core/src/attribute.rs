//! The attribute-set (dataset) abstraction.
//!
//! Instances arrive and are persisted as flat collections of attributes:
//! a canonical tag path, the VR code the producer declared, and an
//! already-decoded payload. Parsing the imaging binary format itself
//! happens upstream; this is the shape the core indexes and stores.

use crate::identity::InstanceIdentity;
use crate::tag::TagPath;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Well-known identity attribute paths.
pub const STUDY_INSTANCE_UID_PATH: &str = "0020000D";
pub const SERIES_INSTANCE_UID_PATH: &str = "0020000E";
pub const SOP_INSTANCE_UID_PATH: &str = "00080018";
pub const SOP_CLASS_UID_PATH: &str = "00080016";

/// Decoded payload of a single attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Time(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    TagReference { group: u16, element: u16 },
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<OffsetDateTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_tag_reference(&self) -> Option<(u16, u16)> {
        match self {
            Self::TagReference { group, element } => Some((*group, *element)),
            _ => None,
        }
    }
}

/// One attribute of an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub path: TagPath,
    /// The VR code as declared by the producer. Kept as a raw string:
    /// datasets legitimately contain VRs the index does not support.
    pub vr: String,
    pub value: RawValue,
}

impl Attribute {
    pub fn new(path: TagPath, vr: impl Into<String>, value: RawValue) -> Self {
        Self {
            path,
            vr: vr.into(),
            value,
        }
    }
}

/// The flat attribute collection of one instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Find the attribute at an exact path, if present.
    pub fn find(&self, path: &TagPath) -> Option<&Attribute> {
        self.attributes.iter().find(|a| &a.path == path)
    }

    fn text_at(&self, path: &str) -> crate::Result<&str> {
        self.attributes
            .iter()
            .find(|a| a.path.as_str() == path)
            .and_then(|a| a.value.as_text())
            .ok_or_else(|| crate::Error::MissingIdentity(path.to_string()))
    }

    /// Read the (study, series, instance) identity triple.
    pub fn identity(&self) -> crate::Result<InstanceIdentity> {
        InstanceIdentity::new(
            self.text_at(STUDY_INSTANCE_UID_PATH)?,
            self.text_at(SERIES_INSTANCE_UID_PATH)?,
            self.text_at(SOP_INSTANCE_UID_PATH)?,
        )
    }

    /// Read the study UID alone, when only parent validation is needed.
    pub fn study_uid(&self) -> crate::Result<&str> {
        self.text_at(STUDY_INSTANCE_UID_PATH)
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}
