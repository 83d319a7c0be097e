//! In-memory storage backend using HashMap and petgraph.
//!
//! This module provides a fast, **ephemeral** storage implementation where all
//! data is held in RAM. Combined with [`load_from_jsonl`] / [`save_to_jsonl`]
//! (or the `Jsonl` backend in [`crate::storage`]) it becomes persistent.
//!
//! # Architecture
//!
//! - `entities`: the entity store, `HashMap<CiId, ConfigurationItem>` plus a
//!   name index enforcing uniqueness
//! - `relationships`: the relationship store, records plus a petgraph
//!   `StableDiGraph` acting as the source/target index
//! - `inner`: both stores side by side, with the operations that need both
//!   (cascade delete, name resolution, CI views)
//! - `traversal`: breadth-first multi-hop walks over the graph
//! - `jsonl`: snapshot load/save
//!
//! ## Edge Direction Convention
//!
//! A relationship `A -[Depends on]-> B` is a graph edge `A -> B` whose weight
//! is the relationship id. Outgoing edges of a CI are the relationships where
//! it is the source, incoming edges those where it is the target.
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<InMemoryStorageInner>>`. Every trait
//! method takes the lock once and performs all of its checks and mutations
//! while holding it, which makes each operation serializable: two concurrent
//! creates with the same name cannot both succeed, and a relationship create
//! racing a cascade delete either fails with `CiNotFound` or is removed by
//! the cascade.

mod entities;
mod inner;
mod jsonl;
mod relationships;
mod traversal;
mod trait_impl;

use crate::error::Result;
use crate::storage::CmdbStorage;
use inner::InMemoryStorageInner;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

// Re-export public API
pub use inner::MISSING_ENDPOINT_LABEL;
pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Thread-safe in-memory storage.
///
/// Cloning shares the underlying state.
pub(crate) type InMemoryStorage = Arc<Mutex<InMemoryStorageInner>>;

/// Create a new, empty in-memory storage instance.
///
/// # Example
///
/// ```
/// use cmdb::storage::in_memory::new_in_memory_storage;
///
/// let storage = new_in_memory_storage();
/// // Share `storage` between callers...
/// ```
#[must_use]
pub fn new_in_memory_storage() -> Arc<dyn CmdbStorage> {
    empty()
}

pub(crate) fn empty() -> InMemoryStorage {
    Arc::new(Mutex::new(InMemoryStorageInner::new()))
}

/// Replace the contents of `storage` with the records in `path`.
///
/// A missing file resets the storage to empty. The file is parsed before the
/// lock is taken, so readers see either the old state or the new one.
pub(crate) async fn reset_from_jsonl(
    storage: &InMemoryStorage,
    path: &Path,
) -> Result<Vec<LoadWarning>> {
    let (fresh, warnings) = if path.exists() {
        jsonl::read_data_file(path).await?
    } else {
        (InMemoryStorageInner::new(), Vec::new())
    };
    *storage.lock().await = fresh;
    Ok(warnings)
}
