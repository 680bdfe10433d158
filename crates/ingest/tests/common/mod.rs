#![allow(dead_code)] // not every test binary uses every helper

use async_trait::async_trait;
use gantry_core::attribute::{
    SERIES_INSTANCE_UID_PATH, SOP_INSTANCE_UID_PATH, STUDY_INSTANCE_UID_PATH,
};
use gantry_core::{Attribute, AttributeSet, RawValue, TagPath, VersionedInstanceIdentity};
use gantry_ingest::error::{EntryError, StoreError};
use gantry_ingest::{IngestionEntry, InstanceStore};
use gantry_metadata::MetadataError;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub fn text_attr(path: &str, vr: &str, value: &str) -> Attribute {
    Attribute::new(
        TagPath::parse(path).unwrap(),
        vr,
        RawValue::Text(value.to_string()),
    )
}

/// A minimal dataset carrying the identity triple.
pub fn dataset(study: &str, series: &str, sop: &str) -> AttributeSet {
    AttributeSet::new(vec![
        text_attr(STUDY_INSTANCE_UID_PATH, "UI", study),
        text_attr(SERIES_INSTANCE_UID_PATH, "UI", series),
        text_attr(SOP_INSTANCE_UID_PATH, "UI", sop),
    ])
}

/// A dataset for the `seed`-th instance of one shared study.
pub fn numbered_dataset(seed: u32) -> AttributeSet {
    dataset("1.2", "1.2.1", &format!("1.2.1.{seed}"))
}

/// Test entry yielding a fixed dataset, optionally after a delay and
/// optionally failing retrieval.
pub struct FakeEntry {
    dataset: Option<AttributeSet>,
    delay: Duration,
}

impl FakeEntry {
    pub fn ok(dataset: AttributeSet) -> Self {
        Self {
            dataset: Some(dataset),
            delay: Duration::ZERO,
        }
    }

    pub fn unreadable() -> Self {
        Self {
            dataset: None,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(dataset: AttributeSet, delay: Duration) -> Self {
        Self {
            dataset: Some(dataset),
            delay,
        }
    }
}

#[async_trait]
impl IngestionEntry for FakeEntry {
    async fn dataset(&self) -> Result<AttributeSet, EntryError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.dataset
            .clone()
            .ok_or_else(|| EntryError("unparsable payload".to_string()))
    }
}

/// In-memory instance store recording completion order.
#[derive(Default)]
pub struct FakeInstanceStore {
    next_version: AtomicI64,
    stored_sops: Mutex<Vec<String>>,
    failing_sops: Mutex<HashSet<String>>,
}

impl FakeInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make storing this SOP UID fail with an infrastructure error.
    pub fn fail_sop(&self, sop: &str) {
        self.failing_sops.lock().unwrap().insert(sop.to_string());
    }

    /// Pre-seed an identity so a later store call reports a duplicate.
    pub fn seed_sop(&self, sop: &str) {
        self.stored_sops.lock().unwrap().push(sop.to_string());
        self.next_version.fetch_add(1, Ordering::SeqCst);
    }

    /// SOP UIDs in the order the store calls completed.
    pub fn completion_order(&self) -> Vec<String> {
        self.stored_sops.lock().unwrap().clone()
    }
}

#[async_trait]
impl InstanceStore for FakeInstanceStore {
    async fn store(
        &self,
        dataset: &AttributeSet,
    ) -> Result<VersionedInstanceIdentity, StoreError> {
        let identity = dataset.identity()?;
        let sop = identity.sop_uid().to_string();

        if self.failing_sops.lock().unwrap().contains(&sop) {
            return Err(StoreError::Metadata(MetadataError::Internal(
                "store unavailable".to_string(),
            )));
        }

        let mut stored = self.stored_sops.lock().unwrap();
        if stored.contains(&sop) {
            return Err(StoreError::Duplicate(format!(
                "instance {identity} already exists"
            )));
        }
        stored.push(sop);
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(VersionedInstanceIdentity::new(identity, version))
    }
}
