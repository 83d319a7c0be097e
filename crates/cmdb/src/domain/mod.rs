//! Domain types for the configuration-management database.
//!
//! The model has two entity collections: configuration items (CIs) and
//! directed, typed relationships between them. Ids are plain integers
//! allocated by the store and never reused.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a CI name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a CI type label.
pub const MAX_TYPE_LENGTH: usize = 50;

/// Maximum length of a CI status label.
pub const MAX_STATUS_LENGTH: usize = 50;

/// Maximum length of a CI owner.
pub const MAX_OWNER_LENGTH: usize = 100;

/// Maximum length of a CI location.
pub const MAX_LOCATION_LENGTH: usize = 200;

/// CI type labels offered to users. The set is open-ended: any non-blank
/// label is accepted by the store.
pub const KNOWN_CI_TYPES: [&str; 8] = [
    "Application",
    "Cloud Service",
    "Container",
    "Database",
    "Network Device",
    "Server",
    "Storage",
    "Virtual Machine",
];

/// Lifecycle status labels offered to users.
pub const KNOWN_STATUSES: [&str; 5] = [
    "Active",
    "Decommissioned",
    "In Maintenance",
    "Provisioning",
    "Retired",
];

/// Unique identifier for a configuration item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CiId(pub u64);

impl fmt::Display for CiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a relationship
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category label of a CI (e.g. "Server", "Database").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiType(String);

impl CiType {
    /// Create a type label
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label is one of [`KNOWN_CI_TYPES`].
    #[must_use]
    pub fn is_known(&self) -> bool {
        KNOWN_CI_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for CiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CiType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status label of a CI (e.g. "Active", "Retired").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiStatus(String);

impl CiStatus {
    /// Create a status label
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label is one of [`KNOWN_STATUSES`].
    #[must_use]
    pub fn is_known(&self) -> bool {
        KNOWN_STATUSES.contains(&self.0.as_str())
    }
}

impl fmt::Display for CiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CiStatus {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A tracked infrastructure or application component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationItem {
    /// Unique identifier, assigned at creation
    pub id: CiId,

    /// Globally unique name (case-sensitive)
    pub name: String,

    /// Category label
    #[serde(rename = "type")]
    pub ci_type: CiType,

    /// Lifecycle status
    pub status: CiStatus,

    /// Owning team or person
    pub owner: Option<String>,

    /// Physical or network location
    pub location: Option<String>,

    /// Free-text description
    pub description: Option<String>,

    /// Set at creation, refreshed on every successful mutation (ISO 8601)
    pub last_updated: DateTime<Utc>,
}

impl ConfigurationItem {
    /// Validate the stored fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a required field is blank or any field
    /// exceeds its maximum length.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.ci_type,
            &self.status,
            self.owner.as_deref(),
            self.location.as_deref(),
        )
    }
}

/// Data for creating a new configuration item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConfigurationItem {
    /// CI name
    pub name: String,

    /// Category label
    pub ci_type: CiType,

    /// Lifecycle status
    pub status: CiStatus,

    /// Owner (optional)
    pub owner: Option<String>,

    /// Location (optional)
    pub location: Option<String>,

    /// Description (optional)
    pub description: Option<String>,
}

impl NewConfigurationItem {
    /// Start a new CI with its required fields.
    pub fn new(
        name: impl Into<String>,
        ci_type: impl Into<CiType>,
        status: impl Into<CiStatus>,
    ) -> Self {
        Self {
            name: name.into(),
            ci_type: ci_type.into(),
            status: status.into(),
            owner: None,
            location: None,
            description: None,
        }
    }

    /// Set the owner
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate the input before it reaches storage.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `name`, `ci_type` or `status` is blank,
    /// or any field exceeds its maximum length.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.ci_type,
            &self.status,
            self.owner.as_deref(),
            self.location.as_deref(),
        )
    }
}

fn validate_fields(
    name: &str,
    ci_type: &CiType,
    status: &CiStatus,
    owner: Option<&str>,
    location: Option<&str>,
) -> Result<()> {
    let mut missing = Vec::new();
    if name.trim().is_empty() {
        missing.push("name");
    }
    if ci_type.as_str().trim().is_empty() {
        missing.push("type");
    }
    if status.as_str().trim().is_empty() {
        missing.push("status");
    }
    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    check_length("name", name, MAX_NAME_LENGTH)?;
    check_length("type", ci_type.as_str(), MAX_TYPE_LENGTH)?;
    check_length("status", status.as_str(), MAX_STATUS_LENGTH)?;
    if let Some(owner) = owner {
        check_length("owner", owner, MAX_OWNER_LENGTH)?;
    }
    if let Some(location) = location {
        check_length("location", location, MAX_LOCATION_LENGTH)?;
    }
    Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::validation(format!(
            "{field} cannot exceed {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Partial update of a configuration item.
///
/// Every field is independent: `None` leaves the stored value untouched.
/// For the optional text fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiUpdate {
    /// New name (uniqueness re-checked against other CIs)
    pub name: Option<String>,

    /// New type
    pub ci_type: Option<CiType>,

    /// New status
    pub status: Option<CiStatus>,

    /// New owner (`Some(None)` to clear)
    pub owner: Option<Option<String>>,

    /// New location (`Some(None)` to clear)
    pub location: Option<Option<String>>,

    /// New description (`Some(None)` to clear)
    pub description: Option<Option<String>>,
}

impl CiUpdate {
    /// Returns true if no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the supplied fields onto `ci`.
    pub(crate) fn apply_to(self, ci: &mut ConfigurationItem) {
        if let Some(name) = self.name {
            ci.name = name;
        }
        if let Some(ci_type) = self.ci_type {
            ci.ci_type = ci_type;
        }
        if let Some(status) = self.status {
            ci.status = status;
        }
        if let Some(owner) = self.owner {
            ci.owner = owner;
        }
        if let Some(location) = self.location {
            ci.location = location;
        }
        if let Some(description) = self.description {
            ci.description = description;
        }
    }
}

/// Type of a relationship. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Source needs target to function
    #[serde(rename = "Depends on")]
    DependsOn,

    /// Source hosts target
    #[serde(rename = "Hosts")]
    Hosts,

    /// Network or physical link
    #[serde(rename = "Connected to")]
    ConnectedTo,

    /// Source executes on target
    #[serde(rename = "Runs on")]
    RunsOn,

    /// Source provides a service to target
    #[serde(rename = "Provides")]
    Provides,
}

impl RelationshipType {
    /// Every allowed relationship type
    pub const ALL: [Self; 5] = [
        Self::DependsOn,
        Self::Hosts,
        Self::ConnectedTo,
        Self::RunsOn,
        Self::Provides,
    ];

    /// The label used in storage and presentation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "Depends on",
            Self::Hosts => "Hosts",
            Self::ConnectedTo => "Connected to",
            Self::RunsOn => "Runs on",
            Self::Provides => "Provides",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                Error::validation(format!(
                    "Invalid relationship type '{s}'. Allowed types are: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// A directed, typed edge between two CIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier
    pub id: RelationshipId,

    /// The CI the edge starts from
    pub source_id: CiId,

    /// The CI the edge points to
    pub target_id: CiId,

    /// Relationship type
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

/// Data for creating a new relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRelationship {
    /// Source CI
    pub source_id: CiId,

    /// Target CI
    pub target_id: CiId,

    /// Relationship type
    pub relationship_type: RelationshipType,
}

impl NewRelationship {
    /// Describe an edge `source -[relationship_type]-> target`.
    #[must_use]
    pub fn new(source_id: CiId, target_id: CiId, relationship_type: RelationshipType) -> Self {
        Self {
            source_id,
            target_id,
            relationship_type,
        }
    }
}

/// A relationship with its endpoint names resolved for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipView {
    /// Relationship id
    pub id: RelationshipId,

    /// Source CI id
    pub source_id: CiId,

    /// Source CI name, or a placeholder if the CI is gone
    pub source_name: String,

    /// Target CI id
    pub target_id: CiId,

    /// Target CI name, or a placeholder if the CI is gone
    pub target_name: String,

    /// Relationship type
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

/// Which edges of a CI to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Edges where the CI is the source (outbound)
    Source,

    /// Edges where the CI is the target (inbound)
    Target,

    /// Both
    #[default]
    All,
}

impl Direction {
    /// The lowercase name accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "target" => Ok(Self::Target),
            "all" => Ok(Self::All),
            _ => Err(Error::validation(format!(
                "Invalid direction '{s}'. Use 'source', 'target', or 'all'"
            ))),
        }
    }
}

/// Filter for listing configuration items.
///
/// Unset predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiFilter {
    /// Exact type match
    pub ci_type: Option<CiType>,

    /// Exact status match
    pub status: Option<CiStatus>,

    /// Case-insensitive substring of the name
    pub name_contains: Option<String>,

    /// Case-insensitive substring of the owner
    pub owner_contains: Option<String>,
}

impl CiFilter {
    /// Returns true if `ci` satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, ci: &ConfigurationItem) -> bool {
        if let Some(ci_type) = &self.ci_type {
            if &ci.ci_type != ci_type {
                return false;
            }
        }

        if let Some(status) = &self.status {
            if &ci.status != status {
                return false;
            }
        }

        if let Some(needle) = &self.name_contains {
            if !contains_ignore_case(&ci.name, needle) {
                return false;
            }
        }

        if let Some(needle) = &self.owner_contains {
            match &ci.owner {
                Some(owner) if contains_ignore_case(owner, needle) => {}
                _ => return false,
            }
        }

        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A CI together with its outbound and inbound relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiView {
    /// The CI itself
    pub ci: ConfigurationItem,

    /// Relationships where the CI is the source
    pub outbound: Vec<RelationshipView>,

    /// Relationships where the CI is the target
    pub inbound: Vec<RelationshipView>,
}

/// Result of a cascading CI deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCi {
    /// The removed CI
    pub ci: ConfigurationItem,

    /// Every relationship removed along with it
    pub relationships: Vec<Relationship>,
}

/// One hop of a multi-hop traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStep {
    /// The edge crossed
    pub relationship: RelationshipView,

    /// Hop count from the starting CI (1 for direct neighbours)
    pub depth: usize,
}

/// Collection sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Number of configuration items
    pub cis: usize,

    /// Number of relationships
    pub relationships: usize,
}
