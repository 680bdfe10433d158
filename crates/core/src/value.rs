//! Value representations and typed value extraction.
//!
//! Each DICOM attribute carries a two-letter value representation (VR)
//! code that determines how its payload is interpreted. The secondary
//! index stores four scalar shapes; the mapping from VR to shape is a
//! fixed table, expressed here as an exhaustive match so an unmapped
//! code cannot slip through at runtime.

use crate::attribute::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// The value representations the index supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueRepresentation {
    /// Application entity.
    Ae,
    /// Age string.
    As,
    /// Attribute tag reference.
    At,
    /// Code string.
    Cs,
    /// Date.
    Da,
    /// Decimal string.
    Ds,
    /// Date time.
    Dt,
    /// Single-precision float.
    Fl,
    /// Double-precision float.
    Fd,
    /// Integer string.
    Is,
    /// Long string.
    Lo,
    /// Person name.
    Pn,
    /// Short string.
    Sh,
    /// Signed long.
    Sl,
    /// Signed short.
    Ss,
    /// Time.
    Tm,
    /// Unique identifier.
    Ui,
    /// Unsigned long.
    Ul,
    /// Unsigned short.
    Us,
}

/// The scalar shape a VR extracts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Float,
    DateTime,
    /// Attribute tag reference, packed into an i64 at extraction.
    TagReference,
}

impl ValueRepresentation {
    /// The standard two-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ae => "AE",
            Self::As => "AS",
            Self::At => "AT",
            Self::Cs => "CS",
            Self::Da => "DA",
            Self::Ds => "DS",
            Self::Dt => "DT",
            Self::Fl => "FL",
            Self::Fd => "FD",
            Self::Is => "IS",
            Self::Lo => "LO",
            Self::Pn => "PN",
            Self::Sh => "SH",
            Self::Sl => "SL",
            Self::Ss => "SS",
            Self::Tm => "TM",
            Self::Ui => "UI",
            Self::Ul => "UL",
            Self::Us => "US",
        }
    }

    /// Look up a code, returning None for VRs the index does not support
    /// (sequences, binary blobs, unknowns).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AE" => Some(Self::Ae),
            "AS" => Some(Self::As),
            "AT" => Some(Self::At),
            "CS" => Some(Self::Cs),
            "DA" => Some(Self::Da),
            "DS" => Some(Self::Ds),
            "DT" => Some(Self::Dt),
            "FL" => Some(Self::Fl),
            "FD" => Some(Self::Fd),
            "IS" => Some(Self::Is),
            "LO" => Some(Self::Lo),
            "PN" => Some(Self::Pn),
            "SH" => Some(Self::Sh),
            "SL" => Some(Self::Sl),
            "SS" => Some(Self::Ss),
            "TM" => Some(Self::Tm),
            "UI" => Some(Self::Ui),
            "UL" => Some(Self::Ul),
            "US" => Some(Self::Us),
            _ => None,
        }
    }

    /// Look up a code, failing with `UnsupportedAttributeType` if unmapped.
    pub fn parse(code: &str) -> crate::Result<Self> {
        Self::from_code(code).ok_or_else(|| crate::Error::UnsupportedAttributeType {
            code: code.to_string(),
        })
    }

    /// The scalar shape this VR extracts to.
    ///
    /// Decimal and integer strings (DS, IS) index as strings: their
    /// wire form is text and round-tripping through a float would lose
    /// precision.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Ae
            | Self::As
            | Self::Cs
            | Self::Ds
            | Self::Is
            | Self::Lo
            | Self::Pn
            | Self::Sh
            | Self::Ui => ValueKind::Str,
            Self::Da | Self::Dt | Self::Tm => ValueKind::DateTime,
            Self::Fl | Self::Fd => ValueKind::Float,
            Self::Sl | Self::Ss | Self::Ul | Self::Us => ValueKind::Int,
            Self::At => ValueKind::TagReference,
        }
    }
}

impl fmt::Display for ValueRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A typed scalar extracted from an attribute, ready for the index.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    Str(String),
    Int(i64),
    Float(f64),
    DateTime(OffsetDateTime),
}

/// Extract the typed scalar for `vr_code` from a raw attribute.
///
/// Fails with `UnsupportedAttributeType` for any code outside the fixed
/// table, and with `MalformedAttribute` when the attribute's payload
/// does not match the VR's shape. Pure: no side effects on any input.
pub fn extract(vr_code: &str, attribute: &Attribute) -> crate::Result<TagValue> {
    let vr = ValueRepresentation::parse(vr_code)?;
    let malformed = |expected: &'static str| crate::Error::MalformedAttribute {
        path: attribute.path.to_string(),
        vr: vr_code.to_string(),
        expected,
    };

    match vr.kind() {
        ValueKind::Str => attribute
            .value
            .as_text()
            .map(|s| TagValue::Str(s.to_string()))
            .ok_or_else(|| malformed("text")),
        ValueKind::Int => attribute
            .value
            .as_integer()
            .map(TagValue::Int)
            .ok_or_else(|| malformed("integer")),
        ValueKind::Float => attribute
            .value
            .as_decimal()
            .map(TagValue::Float)
            .ok_or_else(|| malformed("decimal")),
        ValueKind::DateTime => attribute
            .value
            .as_time()
            .map(TagValue::DateTime)
            .ok_or_else(|| malformed("timestamp")),
        ValueKind::TagReference => attribute
            .value
            .as_tag_reference()
            .map(|(group, element)| TagValue::Int(((group as i64) << 16) | element as i64))
            .ok_or_else(|| malformed("tag reference")),
    }
}
