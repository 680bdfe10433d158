//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{
    IndexValueRepo, InstanceMetadataRepo, InstanceRepo, ReindexJobRepo, TagRepo,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    TagRepo + InstanceRepo + InstanceMetadataRepo + IndexValueRepo + ReindexJobRepo + Send + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under concurrent ingest.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "sqlite metadata store ready");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        db_err.message().contains("UNIQUE constraint")
    } else {
        false
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use gantry_core::{AttributeSet, InstanceIdentity, TagStatus, VersionedInstanceIdentity};
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl TagRepo for SqliteStore {
        async fn create_tags(&self, tags: &[NewTagRow]) -> MetadataResult<Vec<TagRow>> {
            // All-or-nothing: a duplicate path anywhere in the batch rolls
            // back every insert.
            let mut tx = self.pool.begin().await?;
            let created_at = OffsetDateTime::now_utc();
            let mut rows = Vec::with_capacity(tags.len());

            for tag in tags {
                let result = sqlx::query(
                    "INSERT INTO tags (path, vr, level, status, created_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&tag.path)
                .bind(&tag.vr)
                .bind(&tag.level)
                .bind(TagStatus::Reindexing.as_str())
                .bind(created_at)
                .execute(&mut *tx)
                .await;

                let result = match result {
                    Ok(result) => result,
                    Err(e) if is_unique_violation(&e) => {
                        return Err(MetadataError::AlreadyExists(format!(
                            "tag path {} already exists",
                            tag.path
                        )));
                    }
                    Err(e) => return Err(e.into()),
                };

                rows.push(TagRow {
                    key: result.last_insert_rowid(),
                    path: tag.path.clone(),
                    vr: tag.vr.clone(),
                    level: tag.level.clone(),
                    status: TagStatus::Reindexing.as_str().to_string(),
                    created_at,
                });
            }

            tx.commit().await?;
            Ok(rows)
        }

        async fn get_tag(&self, key: i64) -> MetadataResult<Option<TagRow>> {
            let row = sqlx::query_as::<_, TagRow>("SELECT * FROM tags WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_tag_by_path(&self, path: &str) -> MetadataResult<Option<TagRow>> {
            let row = sqlx::query_as::<_, TagRow>("SELECT * FROM tags WHERE path = ?")
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_tags_by_keys(&self, keys: &[i64]) -> MetadataResult<Vec<TagRow>> {
            let mut rows = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(row) = self.get_tag(*key).await? {
                    rows.push(row);
                }
            }
            Ok(rows)
        }

        async fn list_tags(&self) -> MetadataResult<Vec<TagRow>> {
            let rows = sqlx::query_as::<_, TagRow>("SELECT * FROM tags ORDER BY path")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn update_tag_status(&self, key: i64, status: &str) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE tags SET status = ? WHERE key = ?")
                .bind(status)
                .bind(key)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("tag key {key} not found")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl InstanceRepo for SqliteStore {
        async fn create_instance(
            &self,
            identity: &InstanceIdentity,
            created_at: OffsetDateTime,
        ) -> MetadataResult<i64> {
            let result = sqlx::query(
                "INSERT INTO instances (study_uid, series_uid, sop_uid, index_status, created_at) \
                 VALUES (?, ?, ?, 'creating', ?)",
            )
            .bind(identity.study_uid())
            .bind(identity.series_uid())
            .bind(identity.sop_uid())
            .bind(created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(result) => Ok(result.last_insert_rowid()),
                Err(e) if is_unique_violation(&e) => Err(MetadataError::AlreadyExists(format!(
                    "instance {identity} already exists"
                ))),
                Err(e) => Err(e.into()),
            }
        }

        async fn get_instance(&self, version: i64) -> MetadataResult<Option<InstanceRow>> {
            let row = sqlx::query_as::<_, InstanceRow>("SELECT * FROM instances WHERE version = ?")
                .bind(version)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn update_index_status(
            &self,
            version: i64,
            index_status: &str,
        ) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE instances SET index_status = ? WHERE version = ?")
                .bind(index_status)
                .bind(version)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "instance version {version} not found"
                )));
            }
            Ok(())
        }

        async fn latest_instance_version(&self) -> MetadataResult<Option<i64>> {
            let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM instances")
                .fetch_one(&self.pool)
                .await?;
            Ok(version)
        }

        async fn page_instances_below(
            &self,
            watermark: i64,
            page_size: u32,
            index_status: &str,
        ) -> MetadataResult<Vec<InstanceRow>> {
            let rows = sqlx::query_as::<_, InstanceRow>(
                "SELECT * FROM instances WHERE version <= ? AND index_status = ? \
                 ORDER BY version DESC LIMIT ?",
            )
            .bind(watermark)
            .bind(index_status)
            .bind(page_size)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl InstanceMetadataRepo for SqliteStore {
        async fn put_instance_metadata(
            &self,
            version: i64,
            attributes: &AttributeSet,
        ) -> MetadataResult<()> {
            let json = serde_json::to_string(attributes)?;
            sqlx::query(
                "INSERT INTO instance_metadata (version, attributes_json) VALUES (?, ?) \
                 ON CONFLICT(version) DO UPDATE SET attributes_json = excluded.attributes_json",
            )
            .bind(version)
            .bind(json)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_instance_metadata(&self, version: i64) -> MetadataResult<AttributeSet> {
            let json: Option<String> = sqlx::query_scalar(
                "SELECT attributes_json FROM instance_metadata WHERE version = ?",
            )
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;

            match json {
                Some(json) => Ok(serde_json::from_str(&json)?),
                None => Err(MetadataError::NotFound(format!(
                    "no metadata for instance version {version}"
                ))),
            }
        }
    }

    #[async_trait]
    impl IndexValueRepo for SqliteStore {
        async fn insert_string_index(
            &self,
            tag_key: i64,
            instance: &VersionedInstanceIdentity,
            value: &str,
        ) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO index_string (tag_key, version, study_uid, series_uid, sop_uid, value) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(tag_key, version) DO UPDATE SET value = excluded.value",
            )
            .bind(tag_key)
            .bind(instance.version)
            .bind(instance.identity.study_uid())
            .bind(instance.identity.series_uid())
            .bind(instance.identity.sop_uid())
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn insert_int_index(
            &self,
            tag_key: i64,
            instance: &VersionedInstanceIdentity,
            value: i64,
        ) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO index_int (tag_key, version, study_uid, series_uid, sop_uid, value) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(tag_key, version) DO UPDATE SET value = excluded.value",
            )
            .bind(tag_key)
            .bind(instance.version)
            .bind(instance.identity.study_uid())
            .bind(instance.identity.series_uid())
            .bind(instance.identity.sop_uid())
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn insert_float_index(
            &self,
            tag_key: i64,
            instance: &VersionedInstanceIdentity,
            value: f64,
        ) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO index_float (tag_key, version, study_uid, series_uid, sop_uid, value) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(tag_key, version) DO UPDATE SET value = excluded.value",
            )
            .bind(tag_key)
            .bind(instance.version)
            .bind(instance.identity.study_uid())
            .bind(instance.identity.series_uid())
            .bind(instance.identity.sop_uid())
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn insert_datetime_index(
            &self,
            tag_key: i64,
            instance: &VersionedInstanceIdentity,
            value: OffsetDateTime,
        ) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO index_datetime (tag_key, version, study_uid, series_uid, sop_uid, value) \
                 VALUES (?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(tag_key, version) DO UPDATE SET value = excluded.value",
            )
            .bind(tag_key)
            .bind(instance.version)
            .bind(instance.identity.study_uid())
            .bind(instance.identity.series_uid())
            .bind(instance.identity.sop_uid())
            .bind(value)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_string_indexes(&self, tag_key: i64) -> MetadataResult<Vec<StringIndexRow>> {
            let rows = sqlx::query_as::<_, StringIndexRow>(
                "SELECT * FROM index_string WHERE tag_key = ? ORDER BY version",
            )
            .bind(tag_key)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn get_int_indexes(&self, tag_key: i64) -> MetadataResult<Vec<IntIndexRow>> {
            let rows = sqlx::query_as::<_, IntIndexRow>(
                "SELECT * FROM index_int WHERE tag_key = ? ORDER BY version",
            )
            .bind(tag_key)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn get_float_indexes(&self, tag_key: i64) -> MetadataResult<Vec<FloatIndexRow>> {
            let rows = sqlx::query_as::<_, FloatIndexRow>(
                "SELECT * FROM index_float WHERE tag_key = ? ORDER BY version",
            )
            .bind(tag_key)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn get_datetime_indexes(
            &self,
            tag_key: i64,
        ) -> MetadataResult<Vec<DateTimeIndexRow>> {
            let rows = sqlx::query_as::<_, DateTimeIndexRow>(
                "SELECT * FROM index_datetime WHERE tag_key = ? ORDER BY version",
            )
            .bind(tag_key)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl ReindexJobRepo for SqliteStore {
        async fn create_reindex_job(&self, job: &ReindexJobRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO reindex_jobs \
                 (job_id, state, tag_keys, end_watermark, cursor, created_at, updated_at, finished_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(job.job_id)
            .bind(&job.state)
            .bind(&job.tag_keys)
            .bind(job.end_watermark)
            .bind(job.cursor)
            .bind(job.created_at)
            .bind(job.updated_at)
            .bind(job.finished_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_reindex_job(&self, job_id: Uuid) -> MetadataResult<Option<ReindexJobRow>> {
            let row = sqlx::query_as::<_, ReindexJobRow>(
                "SELECT * FROM reindex_jobs WHERE job_id = ?",
            )
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn update_reindex_cursor(
            &self,
            job_id: Uuid,
            cursor: i64,
            updated_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE reindex_jobs SET cursor = ?, updated_at = ? WHERE job_id = ?",
            )
            .bind(cursor)
            .bind(updated_at)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "reindex job {job_id} not found"
                )));
            }
            Ok(())
        }

        async fn update_reindex_state(
            &self,
            job_id: Uuid,
            state: &str,
            finished_at: Option<OffsetDateTime>,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE reindex_jobs SET state = ?, updated_at = ?, finished_at = ? WHERE job_id = ?",
            )
            .bind(state)
            .bind(OffsetDateTime::now_utc())
            .bind(finished_at)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "reindex job {job_id} not found"
                )));
            }
            Ok(())
        }

        async fn unfinished_reindex_jobs(&self) -> MetadataResult<Vec<ReindexJobRow>> {
            let rows = sqlx::query_as::<_, ReindexJobRow>(
                "SELECT * FROM reindex_jobs WHERE state IN ('running', 'cancelled') \
                 ORDER BY created_at",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
-- Extended tags
CREATE TABLE IF NOT EXISTS tags (
    key INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    vr TEXT NOT NULL,
    level TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'reindexing',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tags_status ON tags(status);

-- Instances. AUTOINCREMENT keeps the version watermark strictly
-- increasing and never reassigns a deleted instance's version.
CREATE TABLE IF NOT EXISTS instances (
    version INTEGER PRIMARY KEY AUTOINCREMENT,
    study_uid TEXT NOT NULL,
    series_uid TEXT NOT NULL,
    sop_uid TEXT NOT NULL,
    index_status TEXT NOT NULL DEFAULT 'creating',
    created_at TEXT NOT NULL,
    UNIQUE (study_uid, series_uid, sop_uid)
);
CREATE INDEX IF NOT EXISTS idx_instances_status_version ON instances(index_status, version);

-- Full attribute metadata per instance
CREATE TABLE IF NOT EXISTS instance_metadata (
    version INTEGER PRIMARY KEY REFERENCES instances(version) ON DELETE CASCADE,
    attributes_json TEXT NOT NULL
);

-- Typed extended-tag index tables. The (tag_key, version) primary key
-- plus upsert writes make duplicate index writes idempotent.
CREATE TABLE IF NOT EXISTS index_string (
    tag_key INTEGER NOT NULL REFERENCES tags(key),
    version INTEGER NOT NULL,
    study_uid TEXT NOT NULL,
    series_uid TEXT NOT NULL,
    sop_uid TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (tag_key, version)
);
CREATE INDEX IF NOT EXISTS idx_index_string_value ON index_string(tag_key, value);

CREATE TABLE IF NOT EXISTS index_int (
    tag_key INTEGER NOT NULL REFERENCES tags(key),
    version INTEGER NOT NULL,
    study_uid TEXT NOT NULL,
    series_uid TEXT NOT NULL,
    sop_uid TEXT NOT NULL,
    value INTEGER NOT NULL,
    PRIMARY KEY (tag_key, version)
);
CREATE INDEX IF NOT EXISTS idx_index_int_value ON index_int(tag_key, value);

CREATE TABLE IF NOT EXISTS index_float (
    tag_key INTEGER NOT NULL REFERENCES tags(key),
    version INTEGER NOT NULL,
    study_uid TEXT NOT NULL,
    series_uid TEXT NOT NULL,
    sop_uid TEXT NOT NULL,
    value REAL NOT NULL,
    PRIMARY KEY (tag_key, version)
);
CREATE INDEX IF NOT EXISTS idx_index_float_value ON index_float(tag_key, value);

CREATE TABLE IF NOT EXISTS index_datetime (
    tag_key INTEGER NOT NULL REFERENCES tags(key),
    version INTEGER NOT NULL,
    study_uid TEXT NOT NULL,
    series_uid TEXT NOT NULL,
    sop_uid TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (tag_key, version)
);
CREATE INDEX IF NOT EXISTS idx_index_datetime_value ON index_datetime(tag_key, value);

-- Backfill job bookkeeping; cursor is the page-boundary checkpoint
CREATE TABLE IF NOT EXISTS reindex_jobs (
    job_id BLOB PRIMARY KEY,
    state TEXT NOT NULL DEFAULT 'running',
    tag_keys TEXT NOT NULL,
    end_watermark INTEGER NOT NULL,
    cursor INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    finished_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_reindex_jobs_state ON reindex_jobs(state);
"#;
