//! Query/filter layer.
//!
//! Translates loosely typed request parameters (as they arrive from a form,
//! a query string or the command line) into store-level predicates and typed
//! arguments. Nothing here touches storage.

use crate::domain::{CiFilter, CiId, CiStatus, CiType, Direction, NewRelationship, RelationshipType};
use crate::error::{Error, Result};

/// Raw CI listing parameters.
///
/// Blank values count as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiQuery {
    /// Case-insensitive name substring
    pub name: Option<String>,
    /// Exact type
    pub ci_type: Option<String>,
    /// Exact status
    pub status: Option<String>,
    /// Case-insensitive owner substring
    pub owner: Option<String>,
}

impl CiQuery {
    /// Build the store filter.
    #[must_use]
    pub fn to_filter(&self) -> CiFilter {
        CiFilter {
            ci_type: supplied(self.ci_type.as_deref()).map(CiType::new),
            status: supplied(self.status.as_deref()).map(CiStatus::new),
            name_contains: supplied(self.name.as_deref()).map(str::to_string),
            owner_contains: supplied(self.owner.as_deref()).map(str::to_string),
        }
    }
}

/// Raw "relationships of a CI" parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipQuery {
    /// The CI whose edges are wanted
    pub ci: CiId,
    /// `source`, `target` or `all`; absent means `all`, blank is rejected
    pub direction: Option<String>,
}

impl RelationshipQuery {
    /// Resolve to typed arguments for
    /// [`Cmdb::relationships_of`](crate::graph::Cmdb::relationships_of).
    ///
    /// # Errors
    ///
    /// `Validation` if the direction is not recognised.
    pub fn resolve(&self) -> Result<(CiId, Direction)> {
        Ok((self.ci, parse_direction(self.direction.as_deref())?))
    }
}

/// Parse a direction parameter.
///
/// Absent means [`Direction::All`]. A supplied value must name a
/// direction; blank and unknown values are rejected rather than defaulted.
///
/// # Errors
///
/// `Validation` for blank or unknown values.
pub fn parse_direction(raw: Option<&str>) -> Result<Direction> {
    match raw {
        None => Ok(Direction::All),
        Some(value) => value.parse(),
    }
}

/// Parse a relationship type label such as `"Depends on"`.
///
/// # Errors
///
/// `Validation` if the label is not one of [`RelationshipType::ALL`].
pub fn parse_relationship_type(raw: &str) -> Result<RelationshipType> {
    raw.trim().parse()
}

/// Validate raw relationship-creation parameters.
///
/// Rejects self-loops before they reach storage; storage checks again.
///
/// # Errors
///
/// `Validation` for a self-loop or an unknown type.
pub fn parse_new_relationship(source: CiId, target: CiId, kind: &str) -> Result<NewRelationship> {
    if source == target {
        return Err(Error::validation(
            "Source CI ID and Target CI ID cannot be the same",
        ));
    }
    Ok(NewRelationship::new(
        source,
        target,
        parse_relationship_type(kind)?,
    ))
}

fn supplied(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
