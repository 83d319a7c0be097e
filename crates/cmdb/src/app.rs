//! Application context for CLI command execution.
//!
//! [`App`] resolves configuration, opens the storage backend and hands out
//! the [`Cmdb`] facade to commands.
//!
//! # Example
//!
//! ```no_run
//! use cmdb::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new("."), None).await?;
//!     println!("{:?}", app.cmdb().counts().await?);
//!     Ok(())
//! }
//! ```

use crate::config::CmdbConfig;
use crate::error::Result;
use crate::graph::Cmdb;
use crate::storage::StorageBackend;
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    cmdb: Cmdb,

    /// Project root the configuration was resolved against
    root_dir: PathBuf,

    backend: StorageBackend,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.cmdb/config.yaml`, falling back
    /// to the defaults. `data_file` overrides the configured data file and
    /// forces the JSONL backend.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or storage fails
    /// to open.
    pub async fn from_directory(working_dir: &Path, data_file: Option<&Path>) -> Result<Self> {
        let (root_dir, config) = CmdbConfig::discover(working_dir).await?;

        let backend = match data_file {
            Some(path) => StorageBackend::Jsonl(working_dir.join(path)),
            None => config.storage.to_backend(&root_dir)?,
        };
        tracing::debug!(root = %root_dir.display(), ?backend, "Opening CMDB");

        let cmdb = Cmdb::open(backend.clone()).await?;
        Ok(Self {
            cmdb,
            root_dir,
            backend,
        })
    }

    /// The database facade.
    pub fn cmdb(&self) -> &Cmdb {
        &self.cmdb
    }

    /// Project root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The storage backend in use.
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Persist after a mutating command.
    ///
    /// If the save fails, in-memory state is reloaded so that it matches what
    /// is on disk, and the save error is returned.
    ///
    /// # Errors
    ///
    /// The save error.
    pub async fn save_or_reload(&self) -> Result<()> {
        let Err(save_error) = self.cmdb.save().await else {
            return Ok(());
        };

        tracing::warn!(error = %save_error, "Save failed, reloading from disk");
        if let Err(reload_error) = self.cmdb.reload().await {
            tracing::error!(error = %reload_error, "Reload after failed save also failed");
        }
        Err(save_error)
    }
}
