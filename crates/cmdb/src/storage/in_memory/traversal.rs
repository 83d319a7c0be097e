//! Multi-hop traversal over the relationship graph.
//!
//! Breadth-first walk from a starting CI along outbound edges (what it
//! depends on), inbound edges (what would be impacted if it failed), or both.

use super::inner::InMemoryStorageInner;
use crate::domain::{CiId, Direction, RelationshipId, TraversalStep};
use crate::error::Result;
use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

/// Breadth-first traversal starting at `id`.
///
/// Each relationship is reported at most once, at the depth it is first
/// reached (1 for edges touching the start CI). CIs are expanded at most once,
/// so cycles terminate. `max_depth` of `None` means unlimited.
///
/// # Errors
///
/// - `Error::CiNotFound` if the starting CI doesn't exist
pub(super) fn traverse_impl(
    inner: &InMemoryStorageInner,
    id: CiId,
    direction: Direction,
    max_depth: Option<usize>,
) -> Result<Vec<TraversalStep>> {
    inner.entities.get(id)?;

    let Some(start) = inner.relationships.node_of(id) else {
        return Ok(Vec::new());
    };

    let graph = inner.relationships.graph();
    let edge_directions: &[EdgeDirection] = match direction {
        Direction::Source => &[EdgeDirection::Outgoing],
        Direction::Target => &[EdgeDirection::Incoming],
        Direction::All => &[EdgeDirection::Outgoing, EdgeDirection::Incoming],
    };

    let mut steps = Vec::new();
    let mut seen_edges: HashSet<RelationshipId> = HashSet::new();
    let mut expanded: HashSet<NodeIndex> = HashSet::from([start]);
    let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);

    while let Some((node, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }

        for &edge_direction in edge_directions {
            let mut edges: Vec<_> = graph.edges_directed(node, edge_direction).collect();
            // Deterministic order within a hop
            edges.sort_by_key(|edge| *edge.weight());

            for edge in edges {
                let rel_id = *edge.weight();
                if !seen_edges.insert(rel_id) {
                    continue;
                }

                let relationship = inner.relationships.get(rel_id)?;
                steps.push(TraversalStep {
                    relationship: inner.resolve(relationship),
                    depth: depth + 1,
                });

                let neighbour = match edge_direction {
                    EdgeDirection::Outgoing => edge.target(),
                    EdgeDirection::Incoming => edge.source(),
                };
                if expanded.insert(neighbour) {
                    queue.push_back((neighbour, depth + 1));
                }
            }
        }
    }

    Ok(steps)
}
