//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface using clap's derive API.
//!
//! # Commands
//!
//! - `ci add|show|update|delete|list`: configuration items
//! - `rel add|show|delete|list`: relationships
//! - `impact`: multi-hop walk from a CI
//! - `stats`: collection sizes
//! - `import`: merge another data file into this one
//! - `labels`: known CI types, statuses and relationship types
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--data-file <PATH>`: Use this data file instead of the configured one
//!
//! # Example
//!
//! ```bash
//! cmdb ci add WebServer-Prod-01 --type Server --owner "Web Team"
//! cmdb ci add CustomerDB-Prod-01 --type Database
//! cmdb rel add 1 2 --type "Depends on"
//! cmdb rel list 2 --direction target
//! cmdb impact 2
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{
    CiAction, CiAddArgs, CiArgs, CiListArgs, CiUpdateArgs, ImpactArgs, RelAction, RelArgs,
};
pub use types::WalkArg;
pub use validators::{validate_ci_id, validate_ci_name, validate_relationship_id};

/// cmdb - a configuration-management database
///
/// Track configuration items (servers, applications, databases...) and the
/// typed relationships between them. Data is stored in `.cmdb/cmdb.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "cmdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Data file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage configuration items
    Ci(CiArgs),

    /// Manage relationships between configuration items
    Rel(RelArgs),

    /// Show what depends on a CI, transitively
    ///
    /// Walks inbound relationships by default; use `--walk dependencies`
    /// for what the CI itself relies on.
    Impact(ImpactArgs),

    /// Show summary counts
    Stats,

    /// Merge the records of another data file into this one
    ///
    /// Ids are kept. Nothing is merged if any imported name or id is
    /// already taken.
    Import {
        /// Data file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List known CI types, statuses and relationship types
    Labels,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any configuration, storage or domain error the command hits.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("cmdb configuration-management database");
            println!("Use --help for more information");
            return Ok(());
        };

        if matches!(command, Commands::Labels) {
            return execute::execute_labels(output_mode);
        }

        let app = App::from_directory(&std::env::current_dir()?, self.data_file.as_deref()).await?;

        match command {
            Commands::Ci(args) => execute::execute_ci(&app, &args.action, output_mode).await,
            Commands::Rel(args) => execute::execute_rel(&app, &args.action, output_mode).await,
            Commands::Impact(args) => execute::execute_impact(&app, args, output_mode).await,
            Commands::Stats => execute::execute_stats(&app, output_mode).await,
            Commands::Import { file } => execute::execute_import(&app, file, output_mode).await,
            Commands::Labels => execute::execute_labels(output_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiId, RelationshipId};

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["cmdb"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
        assert!(cli.data_file.is_none());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["cmdb", "stats", "--json", "--data-file", "x.jsonl"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_file, Some(PathBuf::from("x.jsonl")));
        assert!(matches!(cli.command, Some(Commands::Stats)));
    }

    #[test]
    fn test_parse_ci_add() {
        let cli = Cli::try_parse_from([
            "cmdb",
            "ci",
            "add",
            "WebServer-Prod-01",
            "--type",
            "Server",
            "--owner",
            "Web Team",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Ci(CiArgs {
                action: CiAction::Add(args),
            })) => {
                assert_eq!(args.name, "WebServer-Prod-01");
                assert_eq!(args.ci_type, "Server");
                assert_eq!(args.status, "Active"); // default
                assert_eq!(args.owner.as_deref(), Some("Web Team"));
                assert!(args.location.is_none());
            }
            other => panic!("Expected ci add, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ci_add_requires_type() {
        assert!(Cli::try_parse_from(["cmdb", "ci", "add", "x"]).is_err());
    }

    #[test]
    fn test_parse_ci_add_rejects_blank_name() {
        assert!(Cli::try_parse_from(["cmdb", "ci", "add", "  ", "-t", "Server"]).is_err());
    }

    #[test]
    fn test_parse_ci_update_conflicting_owner_flags() {
        assert!(
            Cli::try_parse_from([
                "cmdb",
                "ci",
                "update",
                "1",
                "--owner",
                "a",
                "--clear-owner"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_parse_ci_show_accepts_hash_id() {
        let cli = Cli::try_parse_from(["cmdb", "ci", "show", "#12"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Ci(CiArgs {
                action: CiAction::Show { id: CiId(12) }
            }))
        ));
    }

    #[test]
    fn test_parse_rel_add() {
        let cli =
            Cli::try_parse_from(["cmdb", "rel", "add", "1", "2", "--type", "Depends on"]).unwrap();
        match cli.command {
            Some(Commands::Rel(RelArgs {
                action:
                    RelAction::Add {
                        source,
                        target,
                        kind,
                    },
            })) => {
                assert_eq!(source, CiId(1));
                assert_eq!(target, CiId(2));
                assert_eq!(kind, "Depends on");
            }
            other => panic!("Expected rel add, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rel_delete_scoped_to_ci() {
        let cli = Cli::try_parse_from(["cmdb", "rel", "delete", "5", "--ci", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Rel(RelArgs {
                action: RelAction::Delete {
                    id: RelationshipId(5),
                    ci: Some(CiId(3))
                }
            }))
        ));
    }

    #[test]
    fn test_parse_impact_defaults() {
        let cli = Cli::try_parse_from(["cmdb", "impact", "4"]).unwrap();
        match cli.command {
            Some(Commands::Impact(args)) => {
                assert_eq!(args.id, CiId(4));
                assert_eq!(args.walk, WalkArg::Impact);
                assert!(args.depth.is_none());
            }
            other => panic!("Expected impact, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_impact_rejects_zero_depth() {
        assert!(Cli::try_parse_from(["cmdb", "impact", "4", "--depth", "0"]).is_err());
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["cmdb", "import", "backup.jsonl"]).unwrap();
        match cli.command {
            Some(Commands::Import { file }) => assert_eq!(file, PathBuf::from("backup.jsonl")),
            other => panic!("Expected import, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["cmdb", "import"]).is_err());
    }

    #[test]
    fn test_parse_labels() {
        let cli = Cli::try_parse_from(["cmdb", "labels"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Labels)));
    }
}
