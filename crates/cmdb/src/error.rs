//! Error types for CMDB operations.
//!
//! Every failure the core can report falls into one of a small set of kinds
//! (see [`ErrorKind`]). Persistence and configuration failures are wrapped in
//! [`StorageError`] and [`ConfigError`] so that no raw I/O or serde error
//! escapes the storage boundary.

use crate::domain::{CiId, RelationshipId};
use std::io;
use thiserror::Error;

/// The error type for CMDB operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was missing, malformed or outside its allowed domain.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced configuration item does not exist.
    #[error("Configuration item not found: {0}")]
    CiNotFound(CiId),

    /// The referenced relationship does not exist.
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    /// Another configuration item already uses this name.
    #[error("Configuration item with name '{0}' already exists")]
    DuplicateName(String),

    /// A uniqueness constraint other than the CI name was violated.
    #[error("Duplicate constraint violated: {0}")]
    DuplicateConstraint(String),

    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error while reading or writing the data file.
    #[error("Storage IO error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be serialized.
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The data file is structurally unusable.
    #[error("Invalid data file format: {0}")]
    InvalidFormat(String),

    /// The requested backend is not available.
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    /// The id counter for a record kind has reached `u64::MAX`.
    #[error("No {0} ids left to assign")]
    IdsExhausted(&'static str),
}

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading or writing the configuration file.
    #[error("Configuration IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(String),

    /// A configuration value is not acceptable.
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue {
        /// The offending key.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Coarse classification of an [`Error`], suitable for mapping onto a
/// transport status by a calling collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-domain input.
    Validation,
    /// A referenced id does not exist.
    NotFound,
    /// CI name uniqueness violation.
    DuplicateName,
    /// Any other uniqueness violation.
    DuplicateConstraint,
    /// Persistence failure.
    Storage,
    /// Configuration failure.
    Config,
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the tagged kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::CiNotFound(_) | Self::RelationshipNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::DuplicateConstraint(_) => ErrorKind::DuplicateConstraint,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// A specialized Result type for CMDB operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_share_a_kind() {
        assert_eq!(Error::CiNotFound(CiId(3)).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::RelationshipNotFound(RelationshipId(9)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn storage_errors_are_wrapped() {
        let err: Error = StorageError::InvalidFormat("truncated".into()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.to_string(), "Invalid data file format: truncated");
    }

    #[test]
    fn exhausted_ids_are_a_storage_error() {
        let err: Error = StorageError::IdsExhausted("relationship").into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.to_string(), "No relationship ids left to assign");
    }

    #[test]
    fn duplicate_name_message_names_the_ci() {
        let err = Error::DuplicateName("WebServer-Prod-01".into());
        assert_eq!(
            err.to_string(),
            "Configuration item with name 'WebServer-Prod-01' already exists"
        );
    }
}
