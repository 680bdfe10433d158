//! Per-batch outcome bookkeeping and the derived batch result.

use gantry_core::{InstanceIdentity, VersionedInstanceIdentity};
use std::collections::BTreeMap;

/// DICOM failure reason: processing failure.
pub const PROCESSING_FAILURE: u16 = 0x0110;
/// DICOM failure reason: duplicate SOP instance.
pub const DUPLICATE_SOP_INSTANCE: u16 = 0x0111;
/// DICOM failure reason: dataset failed validation.
pub const VALIDATION_FAILURE: u16 = 0xA900;

/// How one entry resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Duplicate,
    ValidationFailure,
    ProcessingFailure,
}

impl OutcomeKind {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The DICOM failure reason for failed outcomes.
    pub fn reason_code(&self) -> Option<u16> {
        match self {
            Self::Success => None,
            Self::Duplicate => Some(DUPLICATE_SOP_INSTANCE),
            Self::ValidationFailure => Some(VALIDATION_FAILURE),
            Self::ProcessingFailure => Some(PROCESSING_FAILURE),
        }
    }
}

/// Outcome of one submitted entry.
///
/// Identity is best-effort for failures: an entry that failed before
/// its dataset could be read has none.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryOutcome {
    pub kind: OutcomeKind,
    pub identity: Option<InstanceIdentity>,
    /// Watermark assigned at store time; present only on success.
    pub version: Option<i64>,
}

impl EntryOutcome {
    pub fn success(stored: VersionedInstanceIdentity) -> Self {
        Self {
            kind: OutcomeKind::Success,
            identity: Some(stored.identity),
            version: Some(stored.version),
        }
    }

    pub fn duplicate(identity: Option<InstanceIdentity>) -> Self {
        Self {
            kind: OutcomeKind::Duplicate,
            identity,
            version: None,
        }
    }

    pub fn validation_failure(identity: Option<InstanceIdentity>) -> Self {
        Self {
            kind: OutcomeKind::ValidationFailure,
            identity,
            version: None,
        }
    }

    pub fn processing_failure(identity: Option<InstanceIdentity>) -> Self {
        Self {
            kind: OutcomeKind::ProcessingFailure,
            identity,
            version: None,
        }
    }

    pub fn reason_code(&self) -> Option<u16> {
        self.kind.reason_code()
    }
}

/// Derived status of a whole batch, with its verbatim HTTP mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    /// No entries were submitted.
    NoContent,
    /// Every entry succeeded.
    Ok,
    /// Some entries succeeded, some failed.
    Accepted,
    /// At least one entry was submitted and none succeeded.
    Conflict,
}

impl BatchStatus {
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::NoContent => 204,
            Self::Ok => 200,
            Self::Accepted => 202,
            Self::Conflict => 409,
        }
    }
}

/// The aggregate result of one ingestion batch.
#[derive(Clone, Debug)]
pub struct BatchResult {
    status: BatchStatus,
    outcomes: Vec<EntryOutcome>,
}

impl BatchResult {
    /// The empty-batch result: no entries, no payload.
    pub fn no_content() -> Self {
        Self {
            status: BatchStatus::NoContent,
            outcomes: Vec::new(),
        }
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// All outcomes in submission order.
    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    /// The success list of the payload, in submission order.
    pub fn successes(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| o.kind.is_success())
    }

    /// The failure list of the payload, in submission order.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.kind.is_success())
    }
}

/// Accumulates per-entry outcomes keyed by submission index, so the
/// completion order of concurrent entries never leaks into the result.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    outcomes: BTreeMap<usize, EntryOutcome>,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the entry submitted at `submission_index`.
    pub fn add(&mut self, submission_index: usize, outcome: EntryOutcome) {
        self.outcomes.insert(submission_index, outcome);
    }

    /// Derive the batch result. Outcome order is submission order.
    pub fn finalize(self) -> BatchResult {
        let outcomes: Vec<EntryOutcome> = self.outcomes.into_values().collect();
        let status = if outcomes.is_empty() {
            BatchStatus::NoContent
        } else {
            let successes = outcomes.iter().filter(|o| o.kind.is_success()).count();
            if successes == outcomes.len() {
                BatchStatus::Ok
            } else if successes == 0 {
                BatchStatus::Conflict
            } else {
                BatchStatus::Accepted
            }
        };
        BatchResult { status, outcomes }
    }
}
