//! Core in-memory storage data structures.
//!
//! This module holds both tables together. It is wrapped in `Arc<Mutex<>>`
//! so that every logical operation, including the ones that touch both
//! tables (cascade delete, endpoint-checked edge creation, name-resolved
//! views), runs under a single lock.

use super::entities::EntityTable;
use super::relationships::RelationshipTable;
use crate::domain::{
    CiId, CiView, Counts, DeletedCi, Direction, Relationship, RelationshipView,
};
use crate::error::Result;

/// Label used for an endpoint whose CI no longer exists.
pub const MISSING_ENDPOINT_LABEL: &str = "N/A";

/// Inner storage structure (not thread-safe).
#[derive(Debug)]
pub(crate) struct InMemoryStorageInner {
    pub(super) entities: EntityTable,
    pub(super) relationships: RelationshipTable,
}

impl InMemoryStorageInner {
    pub(crate) fn new() -> Self {
        Self {
            entities: EntityTable::new(),
            relationships: RelationshipTable::new(),
        }
    }

    /// Delete a CI and every relationship touching it.
    ///
    /// The existence check happens before anything is removed, so a missing
    /// CI leaves both tables untouched. Everything after the check is
    /// infallible.
    pub(super) fn delete_ci_cascade(&mut self, id: CiId) -> Result<DeletedCi> {
        self.entities.get(id)?;

        let relationships = self.relationships.detach(id);
        let ci = self.entities.remove(id)?;

        Ok(DeletedCi { ci, relationships })
    }

    /// Attach endpoint names to a relationship.
    pub(super) fn resolve(&self, relationship: &Relationship) -> RelationshipView {
        let name = |id| {
            self.entities
                .name_of(id)
                .unwrap_or(MISSING_ENDPOINT_LABEL)
                .to_string()
        };

        RelationshipView {
            id: relationship.id,
            source_id: relationship.source_id,
            source_name: name(relationship.source_id),
            target_id: relationship.target_id,
            target_name: name(relationship.target_id),
            relationship_type: relationship.relationship_type,
        }
    }

    pub(super) fn relationships_of(
        &self,
        id: CiId,
        direction: Direction,
    ) -> Result<Vec<RelationshipView>> {
        self.entities.get(id)?;
        Ok(self
            .relationships
            .by_endpoint(id, direction)
            .into_iter()
            .map(|rel| self.resolve(rel))
            .collect())
    }

    pub(super) fn view_ci(&self, id: CiId) -> Result<CiView> {
        let ci = self.entities.get(id)?.clone();
        Ok(CiView {
            ci,
            outbound: self.relationships_of(id, Direction::Source)?,
            inbound: self.relationships_of(id, Direction::Target)?,
        })
    }

    pub(super) fn counts(&self) -> Counts {
        Counts {
            cis: self.entities.len(),
            relationships: self.relationships.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewConfigurationItem, NewRelationship, RelationshipType};
    use crate::error::Error;

    fn seeded() -> (InMemoryStorageInner, CiId, CiId, CiId) {
        let mut inner = InMemoryStorageInner::new();
        let app = inner
            .entities
            .insert(NewConfigurationItem::new("BillingApp-Prod", "Application", "Active"))
            .unwrap()
            .id;
        let server = inner
            .entities
            .insert(NewConfigurationItem::new("AppServer-Prod-01", "Server", "Active"))
            .unwrap()
            .id;
        let db = inner
            .entities
            .insert(NewConfigurationItem::new("CustomerDB-Prod-01", "Database", "Active"))
            .unwrap()
            .id;

        let InMemoryStorageInner {
            entities,
            relationships,
        } = &mut inner;
        relationships
            .insert(entities, NewRelationship::new(app, server, RelationshipType::RunsOn))
            .unwrap();
        relationships
            .insert(entities, NewRelationship::new(app, db, RelationshipType::DependsOn))
            .unwrap();

        (inner, app, server, db)
    }

    #[test]
    fn test_cascade_removes_ci_and_edges() {
        let (mut inner, app, server, db) = seeded();

        let deleted = inner.delete_ci_cascade(app).unwrap();
        assert_eq!(deleted.ci.name, "BillingApp-Prod");
        assert_eq!(deleted.relationships.len(), 2);

        assert_eq!(inner.counts(), Counts { cis: 2, relationships: 0 });
        assert!(inner.relationships_of(server, Direction::All).unwrap().is_empty());
        assert!(inner.relationships_of(db, Direction::All).unwrap().is_empty());
    }

    #[test]
    fn test_cascade_missing_ci_changes_nothing() {
        let (mut inner, ..) = seeded();
        let err = inner.delete_ci_cascade(CiId(77)).unwrap_err();
        assert!(matches!(err, Error::CiNotFound(CiId(77))));
        assert_eq!(inner.counts(), Counts { cis: 3, relationships: 2 });
    }

    #[test]
    fn test_view_resolves_opposite_names() {
        let (inner, app, server, _) = seeded();

        let view = inner.view_ci(app).unwrap();
        assert_eq!(view.outbound.len(), 2);
        assert!(view.inbound.is_empty());
        assert_eq!(view.outbound[0].target_name, "AppServer-Prod-01");

        let view = inner.view_ci(server).unwrap();
        assert_eq!(view.inbound.len(), 1);
        assert_eq!(view.inbound[0].source_name, "BillingApp-Prod");
    }

    #[test]
    fn test_resolve_uses_placeholder_for_missing_endpoint() {
        let (inner, ..) = seeded();
        let dangling = Relationship {
            id: crate::domain::RelationshipId(500),
            source_id: CiId(1),
            target_id: CiId(404),
            relationship_type: RelationshipType::Hosts,
        };
        let view = inner.resolve(&dangling);
        assert_eq!(view.source_name, "BillingApp-Prod");
        assert_eq!(view.target_name, MISSING_ENDPOINT_LABEL);
    }

    #[test]
    fn test_relationships_of_unknown_ci() {
        let (inner, ..) = seeded();
        assert!(matches!(
            inner.relationships_of(CiId(9), Direction::All),
            Err(Error::CiNotFound(CiId(9)))
        ));
    }
}
