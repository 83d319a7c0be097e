//! JSONL persistence for in-memory storage.
//!
//! A data file is a sequence of tagged records, one JSON object per line:
//!
//! ```text
//! {"record":"sequence","next_ci_id":4,"next_relationship_id":3}
//! {"record":"ci","id":1,"name":"WebServer-Prod-01","type":"Server",...}
//! {"record":"relationship","id":1,"source_id":1,"target_id":2,"type":"Hosts"}
//! ```
//!
//! The sequence record keeps deleted ids from being handed out again after a
//! reload. Saves write records in a fixed order (sequence, CIs by id,
//! relationships by id) so that unchanged data produces identical files.

use super::inner::InMemoryStorageInner;
use crate::domain::{CiId, ConfigurationItem, Relationship, RelationshipId};
use crate::error::{Error, Result, StorageError};
use crate::storage::CmdbStorage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

/// One line of a data file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum SnapshotRecord {
    Sequence {
        next_ci_id: u64,
        next_relationship_id: u64,
    },
    Ci(ConfigurationItem),
    Relationship(Relationship),
}

/// Non-fatal problems found while loading a data file.
///
/// The offending record is skipped and loading continues. Callers should
/// surface these to the user; they usually point at manual edits or a
/// truncated write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line that is not a valid record.
    MalformedJson {
        /// 1-based line number.
        line_number: usize,
        /// Parser message.
        error: String,
    },

    /// A CI record that fails field validation.
    InvalidCi {
        /// 1-based line number.
        line_number: usize,
        /// The record's id.
        id: CiId,
        /// Validation message.
        error: String,
    },

    /// A CI record whose id or name is already taken by an earlier record.
    DuplicateCi {
        /// 1-based line number.
        line_number: usize,
        /// The record's id.
        id: CiId,
        /// Constraint message.
        error: String,
    },

    /// A relationship whose source or target CI is not in the file.
    OrphanedRelationship {
        /// The relationship's id.
        id: RelationshipId,
        /// Source CI.
        source: CiId,
        /// Target CI.
        target: CiId,
    },

    /// A relationship from a CI to itself.
    SelfReferential {
        /// The relationship's id.
        id: RelationshipId,
        /// The CI on both ends.
        ci: CiId,
    },

    /// A relationship whose id is already taken by an earlier record.
    DuplicateRelationship {
        /// The relationship's id.
        id: RelationshipId,
    },

    /// A relationship record that fails validation for another reason.
    InvalidRelationship {
        /// The relationship's id.
        id: RelationshipId,
        /// Validation message.
        error: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record skipped: {error}")
            }
            Self::InvalidCi {
                line_number,
                id,
                error,
            } => write!(f, "line {line_number}: invalid CI {id} skipped: {error}"),
            Self::DuplicateCi {
                line_number,
                id,
                error,
            } => write!(f, "line {line_number}: duplicate CI {id} skipped: {error}"),
            Self::OrphanedRelationship { id, source, target } => write!(
                f,
                "relationship {id} skipped: endpoint missing ({source} -> {target})"
            ),
            Self::SelfReferential { id, ci } => {
                write!(f, "relationship {id} skipped: CI {ci} relates to itself")
            }
            Self::DuplicateRelationship { id } => {
                write!(f, "relationship {id} skipped: id already in use")
            }
            Self::InvalidRelationship { id, error } => {
                write!(f, "relationship {id} skipped: {error}")
            }
        }
    }
}

/// Load storage from a JSONL data file.
///
/// Returns the storage together with every warning raised while loading.
///
/// # Errors
///
/// Only I/O failures are fatal; see [`LoadWarning`] for what gets skipped.
pub async fn load_from_jsonl(path: &Path) -> Result<(Arc<dyn CmdbStorage>, Vec<LoadWarning>)> {
    let (inner, warnings) = read_data_file(path).await?;
    let storage: Arc<dyn CmdbStorage> = Arc::new(Mutex::new(inner));
    Ok((storage, warnings))
}

/// Parse a data file into fresh tables.
///
/// CIs are restored before relationships regardless of line order, so
/// relationships may precede their endpoints in the file.
pub(crate) async fn read_data_file(
    path: &Path,
) -> Result<(InMemoryStorageInner, Vec<LoadWarning>)> {
    let file = File::open(path).await.map_err(StorageError::Io)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let mut warnings = Vec::new();
    let mut cis = Vec::new();
    let mut relationships = Vec::new();
    let mut sequence = (0, 0);
    let mut line_number = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(StorageError::Io)?;
        if read == 0 {
            break;
        }
        line_number += 1;

        // Bad bytes cost one line, not the whole file
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: format!("invalid UTF-8: {e}"),
                });
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SnapshotRecord>(line) {
            Ok(SnapshotRecord::Sequence {
                next_ci_id,
                next_relationship_id,
            }) => {
                sequence = (
                    sequence.0.max(next_ci_id),
                    sequence.1.max(next_relationship_id),
                );
            }
            Ok(SnapshotRecord::Ci(ci)) => cis.push((line_number, ci)),
            Ok(SnapshotRecord::Relationship(rel)) => relationships.push(rel),
            Err(e) => warnings.push(LoadWarning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    let mut inner = InMemoryStorageInner::new();

    for (line_number, ci) in cis {
        let id = ci.id;
        match inner.entities.restore(ci) {
            Ok(()) => {}
            Err(Error::Validation(error)) => warnings.push(LoadWarning::InvalidCi {
                line_number,
                id,
                error,
            }),
            Err(e) => warnings.push(LoadWarning::DuplicateCi {
                line_number,
                id,
                error: e.to_string(),
            }),
        }
    }

    for relationship in relationships {
        let (id, source, target) = (
            relationship.id,
            relationship.source_id,
            relationship.target_id,
        );
        match inner.relationships.restore(&inner.entities, relationship) {
            Ok(()) => {}
            Err(Error::DuplicateConstraint(_)) => {
                warnings.push(LoadWarning::DuplicateRelationship { id });
            }
            Err(Error::Validation(_)) if source == target => {
                warnings.push(LoadWarning::SelfReferential { id, ci: source });
            }
            Err(Error::Validation(error)) => {
                warnings.push(LoadWarning::InvalidRelationship { id, error });
            }
            Err(_) => warnings.push(LoadWarning::OrphanedRelationship { id, source, target }),
        }
    }

    inner.entities.reserve_ids(sequence.0);
    inner.relationships.reserve_ids(sequence.1);

    Ok((inner, warnings))
}

/// Save storage to a JSONL data file with an atomic write.
///
/// Records are written to a sibling `.tmp` file which is then renamed over
/// `path`, so an interrupted save leaves the previous file intact. Missing
/// parent directories are created.
///
/// # Errors
///
/// Returns `Error::Storage` on I/O or serialization failure.
pub async fn save_to_jsonl(storage: &dyn CmdbStorage, path: &Path) -> Result<()> {
    let snapshot = storage.export_snapshot().await?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StorageError::Io)?;
    }

    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path).await.map_err(StorageError::Io)?;
    let mut writer = BufWriter::new(file);

    let records = std::iter::once(SnapshotRecord::Sequence {
        next_ci_id: snapshot.next_ci_id,
        next_relationship_id: snapshot.next_relationship_id,
    })
    .chain(snapshot.cis.into_iter().map(SnapshotRecord::Ci))
    .chain(
        snapshot
            .relationships
            .into_iter()
            .map(SnapshotRecord::Relationship),
    );

    for record in records {
        let json = serde_json::to_string(&record).map_err(StorageError::Serialization)?;
        writer
            .write_all(json.as_bytes())
            .await
            .map_err(StorageError::Io)?;
        writer.write_all(b"\n").await.map_err(StorageError::Io)?;
    }

    writer.flush().await.map_err(StorageError::Io)?;
    drop(writer);

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(StorageError::Io)?;

    Ok(())
}
