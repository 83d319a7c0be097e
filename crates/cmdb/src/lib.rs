//! cmdb - a configuration-management database.
//!
//! This crate provides both a CLI application and a library for tracking
//! configuration items (servers, applications, databases...) and the typed,
//! directed relationships between them.
//!
//! The library entry point is [`Cmdb`], a cloneable handle over a shared
//! [`storage::CmdbStorage`] backend:
//!
//! ```no_run
//! use cmdb::Cmdb;
//! use cmdb::domain::{NewConfigurationItem, NewRelationship, RelationshipType};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> cmdb::Result<()> {
//!     let cmdb = Cmdb::in_memory();
//!     let web = cmdb
//!         .create_ci(NewConfigurationItem::new("WebServer-Prod-01", "Server", "Active"))
//!         .await?;
//!     let db = cmdb
//!         .create_ci(NewConfigurationItem::new("CustomerDB-Prod-01", "Database", "Active"))
//!         .await?;
//!     cmdb.create_relationship(NewRelationship::new(web.id, db.id, RelationshipType::DependsOn))
//!         .await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod error;
pub mod graph;
pub mod query;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

// Application context and configuration
pub mod app;
pub mod config;

// Terminal and JSON rendering
pub mod output;

pub use error::{Error, ErrorKind, Result};
pub use graph::Cmdb;
