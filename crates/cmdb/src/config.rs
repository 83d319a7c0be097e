//! Configuration for the cmdb tool.
//!
//! Configuration lives in `.cmdb/config.yaml` at the root of a project and
//! is found by walking up from the working directory. Without one, the
//! defaults below apply, rooted at the working directory.

use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the cmdb directory
pub const CONFIG_DIR_NAME: &str = ".cmdb";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default data file, relative to the project root
pub const DEFAULT_DATA_FILE: &str = ".cmdb/cmdb.jsonl";

/// Maximum directory depth to traverse when searching for the project root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Backend name for JSONL-persisted storage
pub const BACKEND_JSONL: &str = "jsonl";

/// Backend name for ephemeral storage
pub const BACKEND_MEMORY: &str = "memory";

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CmdbConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// `jsonl` or `memory`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Data file path, relative to the project root unless absolute
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_backend() -> String {
    BACKEND_JSONL.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_file: default_data_file(),
        }
    }
}

impl StorageConfig {
    /// Resolve to a storage backend rooted at `root_dir`.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` for an unknown backend or a blank data
    /// file.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StorageBackend> {
        match self.backend.trim() {
            BACKEND_MEMORY => Ok(StorageBackend::InMemory),
            BACKEND_JSONL => {
                let data_file = self.data_file.trim();
                if data_file.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "storage.data_file",
                        message: "must not be empty".to_string(),
                    }
                    .into());
                }
                Ok(StorageBackend::Jsonl(root_dir.join(data_file)))
            }
            other => Err(ConfigError::InvalidValue {
                field: "storage.backend",
                message: format!("unknown backend '{other}', expected 'jsonl' or 'memory'"),
            }
            .into()),
        }
    }
}

impl CmdbConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file can't be read, `ConfigError::Parse` if
    /// it isn't valid YAML of the expected shape.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(ConfigError::Io)?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file can't be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("YAML error: {e}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(ConfigError::Io)?;
        }
        fs::write(path, content).await.map_err(ConfigError::Io)?;
        Ok(())
    }

    /// Find and load the configuration for `working_dir`.
    ///
    /// Returns the project root together with its configuration. Without a
    /// `.cmdb/config.yaml` anywhere above `working_dir`, the root is
    /// `working_dir` itself and the configuration is the default.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be loaded.
    pub async fn discover(working_dir: &Path) -> Result<(PathBuf, Self)> {
        match find_cmdb_root(working_dir) {
            Some(root) => {
                let path = root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
                tracing::debug!(path = %path.display(), "Loading configuration");
                Ok((root, Self::load(&path).await?))
            }
            None => Ok((working_dir.to_path_buf(), Self::default())),
        }
    }
}

/// Find the project root by searching up the directory tree.
///
/// The root is the nearest directory containing `.cmdb/config.yaml`.
pub fn find_cmdb_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
