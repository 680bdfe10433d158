//! In-memory metadata fakes with instrumentation counters.

use async_trait::async_trait;
use gantry_core::{AttributeSet, InstanceIdentity, VersionedInstanceIdentity};
use gantry_metadata::error::{MetadataError, MetadataResult};
use gantry_metadata::models::{
    DateTimeIndexRow, FloatIndexRow, InstanceRow, IntIndexRow, NewTagRow, ReindexJobRow,
    StringIndexRow, TagRow,
};
use gantry_metadata::{
    IndexValueRepo, InstanceMetadataRepo, InstanceRepo, ReindexJobRepo, TagRepo,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory stand-in for the metadata store.
///
/// Counts page fetches and index writes so tests can pin the exact
/// store traffic a walk produces, and can be switched to fail index
/// writes to exercise failure propagation.
#[derive(Default)]
pub struct FakeMetadata {
    tags: Mutex<Vec<TagRow>>,
    next_tag_key: AtomicI64,
    instances: Mutex<Vec<InstanceRow>>,
    next_version: AtomicI64,
    metadata: Mutex<HashMap<i64, AttributeSet>>,
    pub string_index: Mutex<Vec<StringIndexRow>>,
    pub int_index: Mutex<Vec<IntIndexRow>>,
    pub float_index: Mutex<Vec<FloatIndexRow>>,
    pub datetime_index: Mutex<Vec<DateTimeIndexRow>>,
    jobs: Mutex<HashMap<Uuid, ReindexJobRow>>,
    pub pages_fetched: AtomicUsize,
    pub index_writes: AtomicUsize,
    pub fail_index_writes: AtomicBool,
}

impl FakeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one instance with the given attributes and index status.
    /// Returns the assigned version.
    pub fn seed_instance(
        &self,
        identity: &InstanceIdentity,
        index_status: &str,
        attributes: AttributeSet,
    ) -> i64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        self.instances.lock().unwrap().push(InstanceRow {
            version,
            study_uid: identity.study_uid().to_string(),
            series_uid: identity.series_uid().to_string(),
            sop_uid: identity.sop_uid().to_string(),
            index_status: index_status.to_string(),
            created_at: OffsetDateTime::now_utc(),
        });
        self.metadata.lock().unwrap().insert(version, attributes);
        version
    }

    /// Seed a job row directly, bypassing the async repo call.
    pub fn seed_job(&self, job: ReindexJobRow) {
        self.jobs.lock().unwrap().insert(job.job_id, job);
    }

    pub fn job(&self, job_id: Uuid) -> Option<ReindexJobRow> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }

    pub fn single_job(&self) -> Option<ReindexJobRow> {
        let jobs = self.jobs.lock().unwrap();
        assert!(jobs.len() <= 1, "expected at most one reindex job");
        jobs.values().next().cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn indexed_versions_for(&self, tag_key: i64) -> Vec<i64> {
        let mut versions: Vec<i64> = self
            .string_index
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_key == tag_key)
            .map(|r| r.version)
            .collect();
        versions.sort_unstable();
        versions
    }

    fn check_write_allowed(&self) -> MetadataResult<()> {
        if self.fail_index_writes.load(Ordering::SeqCst) {
            return Err(MetadataError::Internal(
                "index writes disabled by test".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepo for FakeMetadata {
    async fn create_tags(&self, new_tags: &[NewTagRow]) -> MetadataResult<Vec<TagRow>> {
        let mut tags = self.tags.lock().unwrap();
        for tag in new_tags {
            if tags.iter().any(|t| t.path == tag.path) {
                return Err(MetadataError::AlreadyExists(format!(
                    "tag path {} already exists",
                    tag.path
                )));
            }
        }
        let mut rows = Vec::with_capacity(new_tags.len());
        for tag in new_tags {
            let key = self.next_tag_key.fetch_add(1, Ordering::SeqCst) + 1;
            let row = TagRow {
                key,
                path: tag.path.clone(),
                vr: tag.vr.clone(),
                level: tag.level.clone(),
                status: "reindexing".to_string(),
                created_at: OffsetDateTime::now_utc(),
            };
            tags.push(row.clone());
            rows.push(row);
        }
        Ok(rows)
    }

    async fn get_tag(&self, key: i64) -> MetadataResult<Option<TagRow>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.key == key)
            .cloned())
    }

    async fn get_tag_by_path(&self, path: &str) -> MetadataResult<Option<TagRow>> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.path == path)
            .cloned())
    }

    async fn get_tags_by_keys(&self, keys: &[i64]) -> MetadataResult<Vec<TagRow>> {
        let tags = self.tags.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|key| tags.iter().find(|t| t.key == *key).cloned())
            .collect())
    }

    async fn list_tags(&self) -> MetadataResult<Vec<TagRow>> {
        let mut tags = self.tags.lock().unwrap().clone();
        tags.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(tags)
    }

    async fn update_tag_status(&self, key: i64, status: &str) -> MetadataResult<()> {
        let mut tags = self.tags.lock().unwrap();
        match tags.iter_mut().find(|t| t.key == key) {
            Some(tag) => {
                tag.status = status.to_string();
                Ok(())
            }
            None => Err(MetadataError::NotFound(format!("tag key {key} not found"))),
        }
    }
}

#[async_trait]
impl InstanceRepo for FakeMetadata {
    async fn create_instance(
        &self,
        identity: &InstanceIdentity,
        created_at: OffsetDateTime,
    ) -> MetadataResult<i64> {
        let mut instances = self.instances.lock().unwrap();
        if instances.iter().any(|i| {
            i.study_uid == identity.study_uid()
                && i.series_uid == identity.series_uid()
                && i.sop_uid == identity.sop_uid()
        }) {
            return Err(MetadataError::AlreadyExists(format!(
                "instance {identity} already exists"
            )));
        }
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        instances.push(InstanceRow {
            version,
            study_uid: identity.study_uid().to_string(),
            series_uid: identity.series_uid().to_string(),
            sop_uid: identity.sop_uid().to_string(),
            index_status: "creating".to_string(),
            created_at,
        });
        Ok(version)
    }

    async fn get_instance(&self, version: i64) -> MetadataResult<Option<InstanceRow>> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.version == version)
            .cloned())
    }

    async fn update_index_status(&self, version: i64, index_status: &str) -> MetadataResult<()> {
        let mut instances = self.instances.lock().unwrap();
        match instances.iter_mut().find(|i| i.version == version) {
            Some(instance) => {
                instance.index_status = index_status.to_string();
                Ok(())
            }
            None => Err(MetadataError::NotFound(format!(
                "instance version {version} not found"
            ))),
        }
    }

    async fn latest_instance_version(&self) -> MetadataResult<Option<i64>> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.version)
            .max())
    }

    async fn page_instances_below(
        &self,
        watermark: i64,
        page_size: u32,
        index_status: &str,
    ) -> MetadataResult<Vec<InstanceRow>> {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<InstanceRow> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.version <= watermark && i.index_status == index_status)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.version.cmp(&a.version));
        rows.truncate(page_size as usize);
        Ok(rows)
    }
}

#[async_trait]
impl InstanceMetadataRepo for FakeMetadata {
    async fn put_instance_metadata(
        &self,
        version: i64,
        attributes: &AttributeSet,
    ) -> MetadataResult<()> {
        self.metadata
            .lock()
            .unwrap()
            .insert(version, attributes.clone());
        Ok(())
    }

    async fn get_instance_metadata(&self, version: i64) -> MetadataResult<AttributeSet> {
        self.metadata
            .lock()
            .unwrap()
            .get(&version)
            .cloned()
            .ok_or_else(|| {
                MetadataError::NotFound(format!("no metadata for instance version {version}"))
            })
    }
}

#[async_trait]
impl IndexValueRepo for FakeMetadata {
    async fn insert_string_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: &str,
    ) -> MetadataResult<()> {
        self.check_write_allowed()?;
        self.index_writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.string_index.lock().unwrap();
        rows.retain(|r| !(r.tag_key == tag_key && r.version == instance.version));
        rows.push(StringIndexRow {
            tag_key,
            version: instance.version,
            study_uid: instance.identity.study_uid().to_string(),
            series_uid: instance.identity.series_uid().to_string(),
            sop_uid: instance.identity.sop_uid().to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn insert_int_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: i64,
    ) -> MetadataResult<()> {
        self.check_write_allowed()?;
        self.index_writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.int_index.lock().unwrap();
        rows.retain(|r| !(r.tag_key == tag_key && r.version == instance.version));
        rows.push(IntIndexRow {
            tag_key,
            version: instance.version,
            study_uid: instance.identity.study_uid().to_string(),
            series_uid: instance.identity.series_uid().to_string(),
            sop_uid: instance.identity.sop_uid().to_string(),
            value,
        });
        Ok(())
    }

    async fn insert_float_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: f64,
    ) -> MetadataResult<()> {
        self.check_write_allowed()?;
        self.index_writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.float_index.lock().unwrap();
        rows.retain(|r| !(r.tag_key == tag_key && r.version == instance.version));
        rows.push(FloatIndexRow {
            tag_key,
            version: instance.version,
            study_uid: instance.identity.study_uid().to_string(),
            series_uid: instance.identity.series_uid().to_string(),
            sop_uid: instance.identity.sop_uid().to_string(),
            value,
        });
        Ok(())
    }

    async fn insert_datetime_index(
        &self,
        tag_key: i64,
        instance: &VersionedInstanceIdentity,
        value: OffsetDateTime,
    ) -> MetadataResult<()> {
        self.check_write_allowed()?;
        self.index_writes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.datetime_index.lock().unwrap();
        rows.retain(|r| !(r.tag_key == tag_key && r.version == instance.version));
        rows.push(DateTimeIndexRow {
            tag_key,
            version: instance.version,
            study_uid: instance.identity.study_uid().to_string(),
            series_uid: instance.identity.series_uid().to_string(),
            sop_uid: instance.identity.sop_uid().to_string(),
            value,
        });
        Ok(())
    }

    async fn get_string_indexes(&self, tag_key: i64) -> MetadataResult<Vec<StringIndexRow>> {
        let mut rows: Vec<StringIndexRow> = self
            .string_index
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_key == tag_key)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.version);
        Ok(rows)
    }

    async fn get_int_indexes(&self, tag_key: i64) -> MetadataResult<Vec<IntIndexRow>> {
        let mut rows: Vec<IntIndexRow> = self
            .int_index
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_key == tag_key)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.version);
        Ok(rows)
    }

    async fn get_float_indexes(&self, tag_key: i64) -> MetadataResult<Vec<FloatIndexRow>> {
        let mut rows: Vec<FloatIndexRow> = self
            .float_index
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_key == tag_key)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.version);
        Ok(rows)
    }

    async fn get_datetime_indexes(&self, tag_key: i64) -> MetadataResult<Vec<DateTimeIndexRow>> {
        let mut rows: Vec<DateTimeIndexRow> = self
            .datetime_index
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.tag_key == tag_key)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.version);
        Ok(rows)
    }
}

#[async_trait]
impl ReindexJobRepo for FakeMetadata {
    async fn create_reindex_job(&self, job: &ReindexJobRow) -> MetadataResult<()> {
        self.jobs.lock().unwrap().insert(job.job_id, job.clone());
        Ok(())
    }

    async fn get_reindex_job(&self, job_id: Uuid) -> MetadataResult<Option<ReindexJobRow>> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn update_reindex_cursor(
        &self,
        job_id: Uuid,
        cursor: i64,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&job_id) {
            Some(job) => {
                job.cursor = cursor;
                job.updated_at = updated_at;
                Ok(())
            }
            None => Err(MetadataError::NotFound(format!(
                "reindex job {job_id} not found"
            ))),
        }
    }

    async fn update_reindex_state(
        &self,
        job_id: Uuid,
        state: &str,
        finished_at: Option<OffsetDateTime>,
    ) -> MetadataResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&job_id) {
            Some(job) => {
                job.state = state.to_string();
                job.finished_at = finished_at;
                Ok(())
            }
            None => Err(MetadataError::NotFound(format!(
                "reindex job {job_id} not found"
            ))),
        }
    }

    async fn unfinished_reindex_jobs(&self) -> MetadataResult<Vec<ReindexJobRow>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.state == "running" || j.state == "cancelled")
            .cloned()
            .collect())
    }
}
