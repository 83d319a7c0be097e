//! Storage abstraction layer for the CMDB.
//!
//! This module provides the core storage trait and a factory for creating
//! storage backends:
//!
//! - **In-memory**: ephemeral storage backed by HashMap and petgraph
//! - **JSONL**: the in-memory backend plus a data file, written on `save()`
//!
//! # Architecture
//!
//! The trait is async and object-safe; callers share one backend through
//! `Arc<dyn CmdbStorage>`. Every method takes `&self`. Implementations use
//! interior mutability and must make each call atomic with respect to every
//! other call: a concurrent caller observes either none or all of an
//! operation's effects.
//!
//! # Example
//!
//! ```no_run
//! use cmdb::domain::NewConfigurationItem;
//! use cmdb::storage::{StorageBackend, create_storage};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = create_storage(StorageBackend::InMemory).await?;
//!
//!     let ci = storage
//!         .create_ci(NewConfigurationItem::new("WebServer-Prod-01", "Server", "Active"))
//!         .await?;
//!     println!("Created CI {}", ci.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{
    CiFilter, CiId, CiUpdate, CiView, ConfigurationItem, Counts, DeletedCi, Direction,
    NewConfigurationItem, NewRelationship, Relationship, RelationshipId, RelationshipView,
    TraversalStep,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod in_memory;

/// Core storage trait for configuration items and their relationships.
///
/// # Method Categories
///
/// - **Entities**: `create_ci`, `get_ci`, `update_ci`, `delete_ci`, `list_cis`
/// - **Relationships**: `create_relationship`, `get_relationship`,
///   `delete_relationship`, `delete_relationship_for_ci`, `relationships_of`
/// - **Graph**: `resolve`, `view_ci`, `traverse`, `counts`
/// - **Batch Operations**: `import_snapshot`, `export_snapshot`
/// - **Persistence**: `save`, `reload`
///
/// # Error Handling
///
/// - `Validation`: malformed input, self-referential relationships
/// - `CiNotFound` / `RelationshipNotFound`: a referenced record is missing
/// - `DuplicateName`: another CI already uses the name
/// - `Storage`: backend-specific failures
#[async_trait]
pub trait CmdbStorage: Send + Sync {
    // ========== Entity Store ==========

    /// Create a configuration item.
    ///
    /// Assigns the next unused id and stamps `last_updated`.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if a required field is blank or too long
    /// - `Error::DuplicateName` if the name is taken
    async fn create_ci(&self, new_ci: NewConfigurationItem) -> Result<ConfigurationItem>;

    /// Get a configuration item by id.
    ///
    /// # Errors
    ///
    /// `Error::CiNotFound` if no CI has this id.
    async fn get_ci(&self, id: CiId) -> Result<ConfigurationItem>;

    /// Apply a partial update and refresh `last_updated`.
    ///
    /// Either every field in `updates` is applied or none is.
    ///
    /// # Errors
    ///
    /// - `Error::CiNotFound` if the CI doesn't exist
    /// - `Error::Validation` if the result would be invalid
    /// - `Error::DuplicateName` if renaming onto another CI's name
    async fn update_ci(&self, id: CiId, updates: CiUpdate) -> Result<ConfigurationItem>;

    /// Delete a configuration item and every relationship touching it.
    ///
    /// # Errors
    ///
    /// `Error::CiNotFound` if the CI doesn't exist; nothing is removed.
    async fn delete_ci(&self, id: CiId) -> Result<DeletedCi>;

    /// List configuration items matching `filter`, ordered by name.
    async fn list_cis(&self, filter: &CiFilter) -> Result<Vec<ConfigurationItem>>;

    // ========== Relationship Store ==========

    /// Create a relationship between two existing, distinct CIs.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` if source and target are the same CI
    /// - `Error::CiNotFound` if either endpoint doesn't exist
    async fn create_relationship(&self, new_rel: NewRelationship) -> Result<Relationship>;

    /// Get a relationship by id.
    ///
    /// # Errors
    ///
    /// `Error::RelationshipNotFound` if no relationship has this id.
    async fn get_relationship(&self, id: RelationshipId) -> Result<Relationship>;

    /// Attach current endpoint names to a relationship.
    ///
    /// Endpoints that no longer exist are labelled
    /// [`in_memory::MISSING_ENDPOINT_LABEL`].
    async fn resolve(&self, relationship: &Relationship) -> Result<RelationshipView>;

    /// Delete a relationship, returning the removed record.
    ///
    /// # Errors
    ///
    /// `Error::RelationshipNotFound` if it doesn't exist.
    async fn delete_relationship(&self, id: RelationshipId) -> Result<Relationship>;

    /// Delete a relationship only if `ci` is one of its endpoints.
    ///
    /// # Errors
    ///
    /// - `Error::RelationshipNotFound` if it doesn't exist
    /// - `Error::Validation` if it doesn't involve `ci`
    async fn delete_relationship_for_ci(
        &self,
        id: RelationshipId,
        ci: CiId,
    ) -> Result<Relationship>;

    /// Relationships where `id` is the source, the target, or either,
    /// ordered by relationship id with endpoint names resolved.
    ///
    /// # Errors
    ///
    /// `Error::CiNotFound` if the CI doesn't exist.
    async fn relationships_of(
        &self,
        id: CiId,
        direction: Direction,
    ) -> Result<Vec<RelationshipView>>;

    // ========== Graph ==========

    /// A CI with its outbound and inbound relationships.
    ///
    /// # Errors
    ///
    /// `Error::CiNotFound` if the CI doesn't exist.
    async fn view_ci(&self, id: CiId) -> Result<CiView>;

    /// Breadth-first multi-hop walk from `id`.
    ///
    /// `Direction::Source` follows what the CI depends on, `Direction::Target`
    /// what depends on it (impact analysis). `max_depth` of `None` is
    /// unlimited.
    ///
    /// # Errors
    ///
    /// `Error::CiNotFound` if the CI doesn't exist.
    async fn traverse(
        &self,
        id: CiId,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalStep>>;

    /// Number of CIs and relationships.
    async fn counts(&self) -> Result<Counts>;

    // ========== Batch Operations ==========

    /// Merge previously exported records, keeping their ids.
    ///
    /// All-or-nothing: if any record conflicts with existing data or with
    /// another record, storage is left unchanged.
    ///
    /// # Errors
    ///
    /// - `Error::Validation` for invalid records or self-loops
    /// - `Error::DuplicateName` / `Error::DuplicateConstraint` on conflicts
    /// - `Error::CiNotFound` for relationships with missing endpoints
    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Export every record, ordered by id, with the id counters.
    async fn export_snapshot(&self) -> Result<Snapshot>;

    // ========== Persistence ==========

    /// Write the current state to persistent storage.
    ///
    /// No-op for in-memory storage.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory state and re-read persistent storage.
    ///
    /// Used to restore consistency after a failed `save()`. No-op for
    /// in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file cannot be read.
    async fn reload(&self) -> Result<()>;
}

/// Every record in a storage backend, plus the id counters.
///
/// `next_ci_id` and `next_relationship_id` are the ids the backend would hand
/// out next; they may exceed every id present when records were deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Next unused configuration item id.
    pub next_ci_id: u64,
    /// Next unused relationship id.
    pub next_relationship_id: u64,
    /// Configuration items ordered by id.
    pub cis: Vec<ConfigurationItem>,
    /// Relationships ordered by id.
    pub relationships: Vec<Relationship>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// Returns the data file path for file-based backends.
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// In-memory storage that persists to a JSONL file on `save()`.
struct JsonlBackedStorage {
    inner: in_memory::InMemoryStorage,
    path: PathBuf,
    /// Serializes writers of the data file.
    file_lock: Mutex<()>,
}

impl JsonlBackedStorage {
    async fn open(path: PathBuf) -> Result<Self> {
        let inner = in_memory::empty();
        let warnings = in_memory::reset_from_jsonl(&inner, &path).await?;
        log_warnings(&path, &warnings);

        Ok(Self {
            inner,
            path,
            file_lock: Mutex::new(()),
        })
    }
}

fn log_warnings(path: &Path, warnings: &[in_memory::LoadWarning]) {
    for warning in warnings {
        tracing::warn!(path = %path.display(), %warning, "JSONL load warning");
    }
}

#[async_trait]
impl CmdbStorage for JsonlBackedStorage {
    async fn create_ci(&self, new_ci: NewConfigurationItem) -> Result<ConfigurationItem> {
        self.inner.create_ci(new_ci).await
    }

    async fn get_ci(&self, id: CiId) -> Result<ConfigurationItem> {
        self.inner.get_ci(id).await
    }

    async fn update_ci(&self, id: CiId, updates: CiUpdate) -> Result<ConfigurationItem> {
        self.inner.update_ci(id, updates).await
    }

    async fn delete_ci(&self, id: CiId) -> Result<DeletedCi> {
        self.inner.delete_ci(id).await
    }

    async fn list_cis(&self, filter: &CiFilter) -> Result<Vec<ConfigurationItem>> {
        self.inner.list_cis(filter).await
    }

    async fn create_relationship(&self, new_rel: NewRelationship) -> Result<Relationship> {
        self.inner.create_relationship(new_rel).await
    }

    async fn get_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        self.inner.get_relationship(id).await
    }

    async fn resolve(&self, relationship: &Relationship) -> Result<RelationshipView> {
        self.inner.resolve(relationship).await
    }

    async fn delete_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        self.inner.delete_relationship(id).await
    }

    async fn delete_relationship_for_ci(
        &self,
        id: RelationshipId,
        ci: CiId,
    ) -> Result<Relationship> {
        self.inner.delete_relationship_for_ci(id, ci).await
    }

    async fn relationships_of(
        &self,
        id: CiId,
        direction: Direction,
    ) -> Result<Vec<RelationshipView>> {
        self.inner.relationships_of(id, direction).await
    }

    async fn view_ci(&self, id: CiId) -> Result<CiView> {
        self.inner.view_ci(id).await
    }

    async fn traverse(
        &self,
        id: CiId,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalStep>> {
        self.inner.traverse(id, direction, max_depth).await
    }

    async fn counts(&self) -> Result<Counts> {
        self.inner.counts().await
    }

    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.inner.import_snapshot(snapshot).await
    }

    async fn export_snapshot(&self) -> Result<Snapshot> {
        self.inner.export_snapshot().await
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&self) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let warnings = in_memory::reset_from_jsonl(&self.inner, &self.path).await?;
        log_warnings(&self.path, &warnings);
        Ok(())
    }
}

/// Create a storage instance for the given backend.
///
/// For `Jsonl`, an existing data file is loaded; a missing one means an
/// empty store, and the file is created on the first `save()`.
///
/// # Errors
///
/// `Error::Storage` if an existing data file cannot be read.
pub async fn create_storage(backend: StorageBackend) -> Result<Arc<dyn CmdbStorage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage()),
        StorageBackend::Jsonl(path) => {
            tracing::debug!(path = %path.display(), "Opening JSONL storage");
            Ok(Arc::new(JsonlBackedStorage::open(path).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RelationshipType;
    use tempfile::TempDir;

    fn server(name: &str) -> NewConfigurationItem {
        NewConfigurationItem::new(name, "Server", "Active")
    }

    #[test]
    fn test_data_path() {
        assert_eq!(StorageBackend::InMemory.data_path(), None);
        let backend = StorageBackend::Jsonl(PathBuf::from("/tmp/cmdb.jsonl"));
        assert_eq!(backend.data_path(), Some(Path::new("/tmp/cmdb.jsonl")));
    }

    #[tokio::test]
    async fn test_jsonl_missing_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cmdb.jsonl");

        let storage = create_storage(StorageBackend::Jsonl(path.clone()))
            .await
            .unwrap();
        assert_eq!(storage.counts().await.unwrap(), Counts::default());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_jsonl_save_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cmdb.jsonl");

        let storage = create_storage(StorageBackend::Jsonl(path.clone()))
            .await
            .unwrap();
        let a = storage.create_ci(server("a")).await.unwrap();
        let b = storage.create_ci(server("b")).await.unwrap();
        storage
            .create_relationship(NewRelationship::new(a.id, b.id, RelationshipType::Hosts))
            .await
            .unwrap();
        storage.save().await.unwrap();

        let reopened = create_storage(StorageBackend::Jsonl(path)).await.unwrap();
        assert_eq!(
            reopened.counts().await.unwrap(),
            Counts {
                cis: 2,
                relationships: 1
            }
        );
        assert_eq!(reopened.get_ci(a.id).await.unwrap(), a);
    }

    #[tokio::test]
    async fn test_reload_discards_unsaved_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cmdb.jsonl");

        let storage = create_storage(StorageBackend::Jsonl(path)).await.unwrap();
        let saved = storage.create_ci(server("saved")).await.unwrap();
        storage.save().await.unwrap();

        let unsaved = storage.create_ci(server("unsaved")).await.unwrap();
        storage.delete_ci(saved.id).await.unwrap();

        storage.reload().await.unwrap();
        assert!(storage.get_ci(saved.id).await.is_ok());
        assert!(storage.get_ci(unsaved.id).await.is_err());
    }

    #[tokio::test]
    async fn test_reload_without_file_empties_store() {
        let temp_dir = TempDir::new().unwrap();
        let storage = create_storage(StorageBackend::Jsonl(temp_dir.path().join("none.jsonl")))
            .await
            .unwrap();
        storage.create_ci(server("transient")).await.unwrap();

        storage.reload().await.unwrap();
        assert_eq!(storage.counts().await.unwrap().cis, 0);
    }

    #[tokio::test]
    async fn test_in_memory_save_and_reload_are_noops() {
        let storage = create_storage(StorageBackend::InMemory).await.unwrap();
        storage.create_ci(server("kept")).await.unwrap();

        storage.save().await.unwrap();
        storage.reload().await.unwrap();
        assert_eq!(storage.counts().await.unwrap().cis, 1);
    }

    #[tokio::test]
    async fn test_import_is_all_or_nothing() {
        let source = create_storage(StorageBackend::InMemory).await.unwrap();
        source.create_ci(server("x")).await.unwrap();
        source.create_ci(server("taken")).await.unwrap();
        let snapshot = source.export_snapshot().await.unwrap();

        let target = create_storage(StorageBackend::InMemory).await.unwrap();
        target.create_ci(server("placeholder-1")).await.unwrap();
        target.create_ci(server("placeholder-2")).await.unwrap();

        // Ids 1 and 2 are both in use in the target.
        assert!(target.import_snapshot(snapshot).await.is_err());
        let names: Vec<String> = target
            .list_cis(&CiFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|ci| ci.name)
            .collect();
        assert_eq!(names, ["placeholder-1", "placeholder-2"]);
    }
}
