//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Parser, Subcommand};

use super::types::WalkArg;
use super::validators::{
    validate_ci_id, validate_ci_name, validate_ci_type, validate_location, validate_owner,
    validate_relationship_id, validate_status,
};
use crate::domain::{CiId, RelationshipId};

/// Arguments for the `ci` command
#[derive(Parser, Debug, Clone)]
pub struct CiArgs {
    /// Configuration item subcommand
    #[command(subcommand)]
    pub action: CiAction,
}

/// Configuration item actions
#[derive(Subcommand, Debug, Clone)]
pub enum CiAction {
    /// Create a configuration item
    Add(CiAddArgs),

    /// Show a configuration item with its relationships
    Show {
        /// CI id
        #[arg(value_parser = validate_ci_id)]
        id: CiId,
    },

    /// Update fields of a configuration item
    Update(CiUpdateArgs),

    /// Delete a configuration item and all of its relationships
    Delete {
        /// CI id
        #[arg(value_parser = validate_ci_id)]
        id: CiId,
    },

    /// List configuration items, ordered by name
    List(CiListArgs),
}

/// Arguments for `ci add`
#[derive(Parser, Debug, Clone)]
pub struct CiAddArgs {
    /// Unique name (maximum 100 characters)
    #[arg(value_parser = validate_ci_name)]
    pub name: String,

    /// Category, e.g. Server, Application, Database
    #[arg(short = 't', long = "type", value_parser = validate_ci_type)]
    pub ci_type: String,

    /// Lifecycle status, e.g. Active, Retired
    #[arg(short, long, value_parser = validate_status, default_value = "Active")]
    pub status: String,

    /// Owning team or person
    #[arg(short, long, value_parser = validate_owner)]
    pub owner: Option<String>,

    /// Physical or network location
    #[arg(short, long, value_parser = validate_location)]
    pub location: Option<String>,

    /// Free-text description
    #[arg(short = 'D', long)]
    pub description: Option<String>,
}

/// Arguments for `ci update`
#[derive(Parser, Debug, Clone)]
pub struct CiUpdateArgs {
    /// CI id
    #[arg(value_parser = validate_ci_id)]
    pub id: CiId,

    /// New name
    #[arg(short, long, value_parser = validate_ci_name)]
    pub name: Option<String>,

    /// New type
    #[arg(short = 't', long = "type", value_parser = validate_ci_type)]
    pub ci_type: Option<String>,

    /// New status
    #[arg(short, long, value_parser = validate_status)]
    pub status: Option<String>,

    /// New owner
    #[arg(short, long, value_parser = validate_owner, conflicts_with = "clear_owner")]
    pub owner: Option<String>,

    /// Remove the owner
    #[arg(long)]
    pub clear_owner: bool,

    /// New location
    #[arg(short, long, value_parser = validate_location, conflicts_with = "clear_location")]
    pub location: Option<String>,

    /// Remove the location
    #[arg(long)]
    pub clear_location: bool,

    /// New description
    #[arg(short = 'D', long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,
}

/// Arguments for `ci list`
#[derive(Parser, Debug, Clone, Default)]
pub struct CiListArgs {
    /// Case-insensitive name substring
    #[arg(short, long)]
    pub name: Option<String>,

    /// Exact type
    #[arg(short = 't', long = "type")]
    pub ci_type: Option<String>,

    /// Exact status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Case-insensitive owner substring
    #[arg(short, long)]
    pub owner: Option<String>,
}

/// Arguments for the `rel` command
#[derive(Parser, Debug, Clone)]
pub struct RelArgs {
    /// Relationship subcommand
    #[command(subcommand)]
    pub action: RelAction,
}

/// Relationship actions
#[derive(Subcommand, Debug, Clone)]
pub enum RelAction {
    /// Create a relationship SOURCE -[TYPE]-> TARGET
    Add {
        /// Source CI id
        #[arg(value_parser = validate_ci_id)]
        source: CiId,

        /// Target CI id
        #[arg(value_parser = validate_ci_id)]
        target: CiId,

        /// Relationship type: "Depends on", "Hosts", "Connected to",
        /// "Runs on" or "Provides"
        #[arg(short = 't', long = "type")]
        kind: String,
    },

    /// Show a relationship
    Show {
        /// Relationship id
        #[arg(value_parser = validate_relationship_id)]
        id: RelationshipId,
    },

    /// Delete a relationship
    Delete {
        /// Relationship id
        #[arg(value_parser = validate_relationship_id)]
        id: RelationshipId,

        /// Only delete if the relationship touches this CI
        #[arg(long, value_parser = validate_ci_id)]
        ci: Option<CiId>,
    },

    /// List the relationships of a CI
    List {
        /// CI id
        #[arg(value_parser = validate_ci_id)]
        ci: CiId,

        /// source (outbound), target (inbound) or all
        #[arg(short, long)]
        direction: Option<String>,
    },
}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// CI id to start from
    #[arg(value_parser = validate_ci_id)]
    pub id: CiId,

    /// Which way to walk
    #[arg(short, long, value_enum, default_value_t = WalkArg::Impact)]
    pub walk: WalkArg,

    /// Maximum number of hops (unlimited if omitted)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub depth: Option<u16>,
}
