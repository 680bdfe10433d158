//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};

/// Batch ingestion configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum entries of one batch processed concurrently.
    #[serde(default = "default_max_parallel_entries")]
    pub max_parallel_entries: usize,
}

impl IngestConfig {
    /// Create a test configuration with single-entry concurrency.
    ///
    /// **For testing only.** Keeps entry scheduling deterministic.
    pub fn for_testing() -> Self {
        Self {
            max_parallel_entries: 1,
        }
    }
}

fn default_max_parallel_entries() -> usize {
    4
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_parallel_entries: default_max_parallel_entries(),
        }
    }
}

/// Historical backfill (reindex) configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReindexConfig {
    /// Instances fetched per backfill page. Smaller pages yield to
    /// concurrent ingest traffic sooner at the cost of a longer walk;
    /// a page size of 1 is valid but slow.
    #[serde(default = "default_reindex_page_size")]
    pub page_size: u32,
}

impl ReindexConfig {
    /// Create a test configuration with a page size of 1.
    ///
    /// **For testing only.** Pins page-count assertions.
    pub fn for_testing() -> Self {
        Self { page_size: 1 }
    }
}

fn default_reindex_page_size() -> u32 {
    100
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            page_size: default_reindex_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(IngestConfig::default().max_parallel_entries, 4);
        assert_eq!(ReindexConfig::default().page_size, 100);
    }

    #[test]
    fn test_serde_defaults_apply_to_empty_documents() {
        let ingest: IngestConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(ingest.max_parallel_entries, 4);
        let reindex: ReindexConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(reindex.page_size, 100);
    }
}
