#![allow(dead_code)] // not every test binary uses every helper

pub mod fakes;

use fakes::FakeMetadata;
use gantry_core::{
    Attribute, AttributeSet, InstanceIdentity, RawValue, ReindexConfig, TagPath,
};
use gantry_indexing::{IndexWriter, InstanceIndexer, ReindexWalker, TagRegistry};
use std::sync::Arc;

/// Build a walker over the shared fake with the given page size.
pub fn walker(store: &Arc<FakeMetadata>, page_size: u32) -> ReindexWalker {
    let indexer = InstanceIndexer::new(store.clone(), IndexWriter::new(store.clone()));
    ReindexWalker::new(
        store.clone(),
        store.clone(),
        indexer,
        ReindexConfig { page_size },
    )
}

/// Build a registry over the shared fake with the given page size.
pub fn registry(store: &Arc<FakeMetadata>, page_size: u32) -> TagRegistry {
    TagRegistry::new(
        store.clone(),
        store.clone(),
        store.clone(),
        walker(store, page_size),
    )
}

pub fn identity(seed: u32) -> InstanceIdentity {
    InstanceIdentity::new(
        format!("1.2.{seed}"),
        format!("1.2.{seed}.1"),
        format!("1.2.{seed}.1.1"),
    )
    .unwrap()
}

pub fn text_attr(path: &str, vr: &str, value: &str) -> Attribute {
    Attribute::new(
        TagPath::parse(path).unwrap(),
        vr,
        RawValue::Text(value.to_string()),
    )
}

/// Attribute set carrying one indexable string attribute.
pub fn attrs_with(path: &str, value: &str) -> AttributeSet {
    AttributeSet::new(vec![text_attr(path, "LO", value)])
}
