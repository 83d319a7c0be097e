//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time. The store validates again; these only exist to
//! give immediate feedback.

use crate::domain::{
    CiId, MAX_LOCATION_LENGTH, MAX_NAME_LENGTH, MAX_OWNER_LENGTH, MAX_STATUS_LENGTH,
    MAX_TYPE_LENGTH, RelationshipId,
};

fn bounded(field: &str, s: &str, max: usize) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }

    let len = s.chars().count();
    if len > max {
        return Err(format!(
            "{field} cannot exceed {max} characters, got {len} characters"
        ));
    }

    Ok(s.to_string())
}

/// Validate a CI name: non-blank, at most 100 characters.
pub fn validate_ci_name(s: &str) -> Result<String, String> {
    bounded("Name", s, MAX_NAME_LENGTH)
}

/// Validate a CI type label.
pub fn validate_ci_type(s: &str) -> Result<String, String> {
    bounded("Type", s, MAX_TYPE_LENGTH)
}

/// Validate a CI status label.
pub fn validate_status(s: &str) -> Result<String, String> {
    bounded("Status", s, MAX_STATUS_LENGTH)
}

/// Validate an owner.
pub fn validate_owner(s: &str) -> Result<String, String> {
    bounded("Owner", s, MAX_OWNER_LENGTH)
}

/// Validate a location.
pub fn validate_location(s: &str) -> Result<String, String> {
    bounded("Location", s, MAX_LOCATION_LENGTH)
}

fn parse_id(kind: &str, s: &str) -> Result<u64, String> {
    let s = s.trim().trim_start_matches('#');
    match s.parse::<u64>() {
        Ok(0) | Err(_) => Err(format!(
            "Invalid {kind} ID: '{s}'. Expected a positive integer"
        )),
        Ok(id) => Ok(id),
    }
}

/// Parse a CI id. Accepts `7` or `#7`.
pub fn validate_ci_id(s: &str) -> Result<CiId, String> {
    parse_id("CI", s).map(CiId)
}

/// Parse a relationship id. Accepts `7` or `#7`.
pub fn validate_relationship_id(s: &str) -> Result<RelationshipId, String> {
    parse_id("relationship", s).map(RelationshipId)
}
