//! Relationship store: directed, typed edges between CIs.
//!
//! Edges live in a petgraph `StableDiGraph` whose nodes carry [`CiId`]s and
//! whose edges carry [`RelationshipId`]s. The graph is the source/target
//! index: outbound edges of a CI are its outgoing graph edges, inbound edges
//! its incoming ones. `StableDiGraph` keeps edge and node indices valid across
//! removals, so `edge_map`/`node_map` never need rebuilding.
//!
//! Referential integrity is checked here against the [`EntityTable`], not
//! only by callers: an edge is never created to a CI that does not exist or
//! from a CI to itself.

use super::entities::EntityTable;
use crate::domain::{CiId, Direction, NewRelationship, Relationship, RelationshipId};
use crate::error::{Error, Result, StorageError};
use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug)]
pub(crate) struct RelationshipTable {
    /// Relationship records indexed by ID
    records: HashMap<RelationshipId, Relationship>,

    /// Edge direction: source CI -> target CI
    graph: StableDiGraph<CiId, RelationshipId>,

    /// CI -> graph node. Nodes are created lazily on a CI's first edge.
    node_map: HashMap<CiId, NodeIndex>,

    /// Relationship -> graph edge
    edge_map: HashMap<RelationshipId, EdgeIndex>,

    next_id: u64,
}

impl RelationshipTable {
    pub(crate) fn new() -> Self {
        Self {
            records: HashMap::new(),
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            next_id: 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    pub(crate) fn reserve_ids(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    pub(crate) fn get(&self, id: RelationshipId) -> Result<&Relationship> {
        self.records.get(&id).ok_or(Error::RelationshipNotFound(id))
    }

    /// Create an edge after checking it against the entity table.
    pub(crate) fn insert(
        &mut self,
        entities: &EntityTable,
        new_rel: NewRelationship,
    ) -> Result<Relationship> {
        check_endpoints(entities, new_rel.source_id, new_rel.target_id)?;
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or(StorageError::IdsExhausted("relationship"))?;

        let relationship = Relationship {
            id: RelationshipId(self.next_id),
            source_id: new_rel.source_id,
            target_id: new_rel.target_id,
            relationship_type: new_rel.relationship_type,
        };
        self.next_id = next_id;

        self.link(relationship.clone());
        Ok(relationship)
    }

    /// Insert an existing record (import path), keeping its id.
    pub(crate) fn restore(&mut self, entities: &EntityTable, relationship: Relationship) -> Result<()> {
        if self.records.contains_key(&relationship.id) {
            return Err(Error::DuplicateConstraint(format!(
                "relationship id {} is already in use",
                relationship.id
            )));
        }
        let after = relationship.id.0.checked_add(1).ok_or_else(|| {
            Error::validation(format!(
                "relationship id {} is out of range",
                relationship.id
            ))
        })?;
        check_endpoints(entities, relationship.source_id, relationship.target_id)?;

        self.next_id = self.next_id.max(after);
        self.link(relationship);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: RelationshipId) -> Result<Relationship> {
        let relationship = self
            .records
            .remove(&id)
            .ok_or(Error::RelationshipNotFound(id))?;
        if let Some(edge) = self.edge_map.remove(&id) {
            self.graph.remove_edge(edge);
        }
        Ok(relationship)
    }

    /// Relationships touching `ci` in the given direction, ordered by id.
    ///
    /// A CI without a graph node simply has no edges.
    pub(crate) fn by_endpoint(&self, ci: CiId, direction: Direction) -> Vec<&Relationship> {
        let Some(&node) = self.node_map.get(&ci) else {
            return Vec::new();
        };

        let mut ids: Vec<RelationshipId> = match direction {
            Direction::Source => self.edge_ids(node, EdgeDirection::Outgoing).collect(),
            Direction::Target => self.edge_ids(node, EdgeDirection::Incoming).collect(),
            Direction::All => self
                .edge_ids(node, EdgeDirection::Outgoing)
                .chain(self.edge_ids(node, EdgeDirection::Incoming))
                .collect(),
        };
        ids.sort_unstable();
        ids.dedup();

        ids.iter().filter_map(|id| self.records.get(id)).collect()
    }

    /// Remove every edge touching `ci`, and its graph node.
    ///
    /// Returns the removed relationships ordered by id.
    pub(crate) fn detach(&mut self, ci: CiId) -> Vec<Relationship> {
        let Some(node) = self.node_map.remove(&ci) else {
            return Vec::new();
        };

        let mut ids: Vec<RelationshipId> = self
            .edge_ids(node, EdgeDirection::Outgoing)
            .chain(self.edge_ids(node, EdgeDirection::Incoming))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let removed = ids
            .into_iter()
            .filter_map(|id| {
                self.edge_map.remove(&id);
                self.records.remove(&id)
            })
            .collect();

        // Drops the node together with any remaining incident edges.
        self.graph.remove_node(node);
        removed
    }

    /// All relationships ordered by id.
    pub(crate) fn all_by_id(&self) -> Vec<Relationship> {
        let mut relationships: Vec<Relationship> = self.records.values().cloned().collect();
        relationships.sort_by_key(|rel| rel.id);
        relationships
    }

    /// Read access to the graph index for traversal.
    pub(crate) fn graph(&self) -> &StableDiGraph<CiId, RelationshipId> {
        &self.graph
    }

    pub(crate) fn node_of(&self, ci: CiId) -> Option<NodeIndex> {
        self.node_map.get(&ci).copied()
    }

    fn edge_ids(
        &self,
        node: NodeIndex,
        direction: EdgeDirection,
    ) -> impl Iterator<Item = RelationshipId> + '_ {
        self.graph
            .edges_directed(node, direction)
            .map(|edge| *edge.weight())
    }

    fn ensure_node(&mut self, ci: CiId) -> NodeIndex {
        if let Some(&node) = self.node_map.get(&ci) {
            return node;
        }
        let node = self.graph.add_node(ci);
        self.node_map.insert(ci, node);
        node
    }

    fn link(&mut self, relationship: Relationship) {
        let from = self.ensure_node(relationship.source_id);
        let to = self.ensure_node(relationship.target_id);
        let edge = self.graph.add_edge(from, to, relationship.id);
        self.edge_map.insert(relationship.id, edge);
        self.records.insert(relationship.id, relationship);
    }
}

/// No self-loops, and both endpoints must exist.
fn check_endpoints(entities: &EntityTable, source: CiId, target: CiId) -> Result<()> {
    if source == target {
        return Err(Error::validation(
            "Source CI ID and Target CI ID cannot be the same",
        ));
    }
    if !entities.contains(source) {
        return Err(Error::CiNotFound(source));
    }
    if !entities.contains(target) {
        return Err(Error::CiNotFound(target));
    }
    Ok(())
}
