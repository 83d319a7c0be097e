//! Graph facade over the entity and relationship stores.
//!
//! [`Cmdb`] is the entry point request handlers use. It is the only layer
//! that combines both stores in one logical operation (cascade delete,
//! name-resolved relationship listings, CI views). The combination itself
//! runs inside the storage backend under a single lock; the facade adds
//! logging and turns raw relationships into presentation views.
//!
//! `Cmdb` is cheap to clone and every clone shares the same store, so it can
//! be handed to any number of concurrent tasks.

use crate::domain::{
    CiFilter, CiId, CiUpdate, CiView, ConfigurationItem, Counts, DeletedCi, Direction,
    NewConfigurationItem, NewRelationship, Relationship, RelationshipId, RelationshipView,
    TraversalStep,
};
use crate::error::Result;
use crate::storage::{CmdbStorage, StorageBackend, create_storage, in_memory};
use std::path::Path;
use std::sync::Arc;

/// Shared handle to a configuration-management database.
#[derive(Clone)]
pub struct Cmdb {
    storage: Arc<dyn CmdbStorage>,
}

impl std::fmt::Debug for Cmdb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cmdb").finish_non_exhaustive()
    }
}

impl Cmdb {
    /// Wrap an existing storage backend.
    pub fn new(storage: Arc<dyn CmdbStorage>) -> Self {
        Self { storage }
    }

    /// An empty, ephemeral database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(in_memory::new_in_memory_storage())
    }

    /// Open a database on the given backend.
    ///
    /// # Errors
    ///
    /// `Error::Storage` if an existing data file cannot be read.
    pub async fn open(backend: StorageBackend) -> Result<Self> {
        Ok(Self::new(create_storage(backend).await?))
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &Arc<dyn CmdbStorage> {
        &self.storage
    }

    // ========== Configuration items ==========

    /// Create a configuration item.
    ///
    /// # Errors
    ///
    /// `Validation` for blank or oversized fields, `DuplicateName` if the name
    /// is taken.
    pub async fn create_ci(&self, new_ci: NewConfigurationItem) -> Result<ConfigurationItem> {
        let ci = self.storage.create_ci(new_ci).await?;
        tracing::debug!(id = %ci.id, name = %ci.name, "Created CI");
        Ok(ci)
    }

    /// Get a configuration item.
    ///
    /// # Errors
    ///
    /// `CiNotFound` if it doesn't exist.
    pub async fn get_ci(&self, id: CiId) -> Result<ConfigurationItem> {
        self.storage.get_ci(id).await
    }

    /// Apply a partial update to a configuration item.
    ///
    /// # Errors
    ///
    /// `CiNotFound`, `Validation`, or `DuplicateName` when renaming onto
    /// another CI's name. On error the stored record is unchanged.
    pub async fn update_ci(&self, id: CiId, updates: CiUpdate) -> Result<ConfigurationItem> {
        let ci = self.storage.update_ci(id, updates).await?;
        tracing::debug!(id = %ci.id, name = %ci.name, "Updated CI");
        Ok(ci)
    }

    /// Delete a CI together with every relationship that touches it.
    ///
    /// All-or-nothing: a missing CI fails with `CiNotFound` and removes no
    /// relationships.
    ///
    /// # Errors
    ///
    /// `CiNotFound` if the CI doesn't exist.
    pub async fn delete_ci_with_cascade(&self, id: CiId) -> Result<DeletedCi> {
        let deleted = self.storage.delete_ci(id).await?;
        tracing::info!(
            id = %deleted.ci.id,
            name = %deleted.ci.name,
            relationships = deleted.relationships.len(),
            "Deleted CI with cascade"
        );
        Ok(deleted)
    }

    /// Configuration items matching `filter`, ordered by name.
    ///
    /// # Errors
    ///
    /// Only backend failures.
    pub async fn list_cis(&self, filter: &CiFilter) -> Result<Vec<ConfigurationItem>> {
        self.storage.list_cis(filter).await
    }

    // ========== Relationships ==========

    /// Create a relationship and return it with endpoint names resolved.
    ///
    /// # Errors
    ///
    /// `Validation` for a self-loop, `CiNotFound` if either endpoint is
    /// missing.
    pub async fn create_relationship(&self, new_rel: NewRelationship) -> Result<RelationshipView> {
        let relationship = self.storage.create_relationship(new_rel).await?;
        tracing::debug!(
            id = %relationship.id,
            source = %relationship.source_id,
            target = %relationship.target_id,
            kind = %relationship.relationship_type,
            "Created relationship"
        );
        self.storage.resolve(&relationship).await
    }

    /// Get a relationship with endpoint names resolved.
    ///
    /// # Errors
    ///
    /// `RelationshipNotFound` if it doesn't exist.
    pub async fn get_relationship(&self, id: RelationshipId) -> Result<RelationshipView> {
        let relationship = self.storage.get_relationship(id).await?;
        self.storage.resolve(&relationship).await
    }

    /// Delete a relationship.
    ///
    /// # Errors
    ///
    /// `RelationshipNotFound` if it doesn't exist.
    pub async fn delete_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        let relationship = self.storage.delete_relationship(id).await?;
        tracing::debug!(id = %relationship.id, "Deleted relationship");
        Ok(relationship)
    }

    /// Delete a relationship only if `ci` is one of its endpoints.
    ///
    /// # Errors
    ///
    /// `RelationshipNotFound` if it doesn't exist, `Validation` if it
    /// belongs to other CIs.
    pub async fn delete_relationship_for_ci(
        &self,
        id: RelationshipId,
        ci: CiId,
    ) -> Result<Relationship> {
        let relationship = self.storage.delete_relationship_for_ci(id, ci).await?;
        tracing::debug!(id = %relationship.id, ci = %ci, "Deleted relationship");
        Ok(relationship)
    }

    /// Relationships of a CI in the given direction, ordered by id.
    ///
    /// # Errors
    ///
    /// `CiNotFound` if the CI doesn't exist.
    pub async fn relationships_of(
        &self,
        id: CiId,
        direction: Direction,
    ) -> Result<Vec<RelationshipView>> {
        self.storage.relationships_of(id, direction).await
    }

    // ========== Graph views ==========

    /// A CI with its outbound and inbound relationships.
    ///
    /// # Errors
    ///
    /// `CiNotFound` if the CI doesn't exist.
    pub async fn view_ci(&self, id: CiId) -> Result<CiView> {
        self.storage.view_ci(id).await
    }

    /// Multi-hop walk from a CI; see [`CmdbStorage::traverse`].
    ///
    /// # Errors
    ///
    /// `CiNotFound` if the CI doesn't exist.
    pub async fn traverse(
        &self,
        id: CiId,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalStep>> {
        self.storage.traverse(id, direction, max_depth).await
    }

    /// Number of CIs and relationships.
    ///
    /// # Errors
    ///
    /// Only backend failures.
    pub async fn counts(&self) -> Result<Counts> {
        self.storage.counts().await
    }

    // ========== Import ==========

    /// Merge the records of another data file into this database.
    ///
    /// The file is read like any data file, so bad records are skipped and
    /// logged. What survives is merged all-or-nothing with ids kept as they
    /// are. Returns how many records were merged.
    ///
    /// # Errors
    ///
    /// - `Storage` if the file cannot be read
    /// - `DuplicateName` / `DuplicateConstraint` if an imported name or id
    ///   is already taken
    pub async fn import_file(&self, path: &Path) -> Result<Counts> {
        let (source, warnings) = in_memory::load_from_jsonl(path).await?;
        for warning in &warnings {
            tracing::warn!(path = %path.display(), %warning, "Import skipped a record");
        }

        let snapshot = source.export_snapshot().await?;
        let imported = Counts {
            cis: snapshot.cis.len(),
            relationships: snapshot.relationships.len(),
        };
        self.storage.import_snapshot(snapshot).await?;

        tracing::info!(
            cis = imported.cis,
            relationships = imported.relationships,
            "Imported records"
        );
        Ok(imported)
    }

    // ========== Persistence ==========

    /// Persist the current state.
    ///
    /// # Errors
    ///
    /// `Storage` if writing fails.
    pub async fn save(&self) -> Result<()> {
        self.storage.save().await?;
        tracing::debug!("Saved CMDB");
        Ok(())
    }

    /// Discard unsaved changes and re-read persisted state.
    ///
    /// # Errors
    ///
    /// `Storage` if reading fails.
    pub async fn reload(&self) -> Result<()> {
        self.storage.reload().await?;
        tracing::info!("Reloaded CMDB from persistent storage");
        Ok(())
    }
}
