//! CmdbStorage trait implementation for in-memory storage.
//!
//! Implemented on the mutex itself so that the shared handle
//! (`Arc<Mutex<InMemoryStorageInner>>`) coerces directly to `Arc<dyn CmdbStorage>`.

use super::inner::InMemoryStorageInner;
use super::traversal::traverse_impl;
use crate::domain::{
    CiFilter, CiId, CiUpdate, CiView, ConfigurationItem, Counts, DeletedCi, Direction,
    NewConfigurationItem, NewRelationship, Relationship, RelationshipId, RelationshipView,
    TraversalStep,
};
use crate::error::{Error, Result};
use crate::storage::{CmdbStorage, Snapshot};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[async_trait]
impl CmdbStorage for Mutex<InMemoryStorageInner> {
    async fn create_ci(&self, new_ci: NewConfigurationItem) -> Result<ConfigurationItem> {
        let mut inner = self.lock().await;
        inner.entities.insert(new_ci)
    }

    async fn get_ci(&self, id: CiId) -> Result<ConfigurationItem> {
        let inner = self.lock().await;
        inner.entities.get(id).cloned()
    }

    async fn update_ci(&self, id: CiId, updates: CiUpdate) -> Result<ConfigurationItem> {
        let mut inner = self.lock().await;
        inner.entities.update(id, updates)
    }

    async fn delete_ci(&self, id: CiId) -> Result<DeletedCi> {
        let mut inner = self.lock().await;
        inner.delete_ci_cascade(id)
    }

    async fn list_cis(&self, filter: &CiFilter) -> Result<Vec<ConfigurationItem>> {
        let inner = self.lock().await;
        Ok(inner.entities.list(filter))
    }

    async fn create_relationship(&self, new_rel: NewRelationship) -> Result<Relationship> {
        let mut inner = self.lock().await;
        let InMemoryStorageInner {
            entities,
            relationships,
        } = &mut *inner;
        relationships.insert(entities, new_rel)
    }

    async fn get_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        let inner = self.lock().await;
        inner.relationships.get(id).cloned()
    }

    async fn resolve(&self, relationship: &Relationship) -> Result<RelationshipView> {
        let inner = self.lock().await;
        Ok(inner.resolve(relationship))
    }

    async fn delete_relationship(&self, id: RelationshipId) -> Result<Relationship> {
        let mut inner = self.lock().await;
        inner.relationships.remove(id)
    }

    async fn delete_relationship_for_ci(
        &self,
        id: RelationshipId,
        ci: CiId,
    ) -> Result<Relationship> {
        let mut inner = self.lock().await;

        let relationship = inner.relationships.get(id)?;
        if relationship.source_id != ci && relationship.target_id != ci {
            return Err(Error::validation(format!(
                "Relationship {id} does not involve CI {ci}"
            )));
        }

        inner.relationships.remove(id)
    }

    async fn relationships_of(
        &self,
        id: CiId,
        direction: Direction,
    ) -> Result<Vec<RelationshipView>> {
        let inner = self.lock().await;
        inner.relationships_of(id, direction)
    }

    async fn view_ci(&self, id: CiId) -> Result<CiView> {
        let inner = self.lock().await;
        inner.view_ci(id)
    }

    async fn traverse(
        &self,
        id: CiId,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Vec<TraversalStep>> {
        let inner = self.lock().await;
        traverse_impl(&inner, id, direction, max_depth)
    }

    async fn counts(&self) -> Result<Counts> {
        let inner = self.lock().await;
        Ok(inner.counts())
    }

    async fn import_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        // Build the merged state on a scratch copy so that a bad record
        // leaves the live tables untouched.
        let mut inner = self.lock().await;
        let mut staged = InMemoryStorageInner::new();

        for ci in inner.entities.all_by_id() {
            staged.entities.restore(ci)?;
        }
        for relationship in inner.relationships.all_by_id() {
            staged.relationships.restore(&staged.entities, relationship)?;
        }
        staged.entities.reserve_ids(inner.entities.next_id());
        staged.relationships.reserve_ids(inner.relationships.next_id());

        for ci in snapshot.cis {
            staged.entities.restore(ci)?;
        }
        for relationship in snapshot.relationships {
            staged.relationships.restore(&staged.entities, relationship)?;
        }
        staged.entities.reserve_ids(snapshot.next_ci_id);
        staged
            .relationships
            .reserve_ids(snapshot.next_relationship_id);

        *inner = staged;
        Ok(())
    }

    async fn export_snapshot(&self) -> Result<Snapshot> {
        let inner = self.lock().await;
        Ok(Snapshot {
            next_ci_id: inner.entities.next_id(),
            next_relationship_id: inner.relationships.next_id(),
            cis: inner.entities.all_by_id(),
            relationships: inner.relationships.all_by_id(),
        })
    }

    async fn save(&self) -> Result<()> {
        // In-memory storage doesn't persist to disk
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        // Nothing to reload from
        Ok(())
    }
}
