//! Repository traits for metadata operations.

pub mod index_values;
pub mod instance_metadata;
pub mod instances;
pub mod reindex_jobs;
pub mod tags;

pub use index_values::IndexValueRepo;
pub use instance_metadata::InstanceMetadataRepo;
pub use instances::InstanceRepo;
pub use reindex_jobs::{ReindexJobRepo, ReindexJobState};
pub use tags::TagRepo;
