//! Command execution logic.
//!
//! Each command translates its arguments through the query layer, calls the
//! [`Cmdb`](crate::graph::Cmdb) facade, persists if it mutated anything and
//! prints the result.

use anyhow::Result;
use std::path::Path;

use super::args::{CiAction, CiAddArgs, CiListArgs, CiUpdateArgs, ImpactArgs, RelAction};
use crate::app::App;
use crate::domain::{CiStatus, CiType, CiUpdate, Direction, NewConfigurationItem};
use crate::output::{self, OutputMode};
use crate::query::{CiQuery, RelationshipQuery, parse_new_relationship};

/// Execute a `ci` subcommand
pub async fn execute_ci(app: &App, action: &CiAction, output_mode: OutputMode) -> Result<()> {
    let cmdb = app.cmdb();

    match action {
        CiAction::Add(args) => {
            let ci = cmdb.create_ci(new_ci_from_args(args)).await?;
            app.save_or_reload().await?;
            match output_mode {
                OutputMode::Json => output::print_json(&ci)?,
                OutputMode::Text => {
                    let config = output::OutputConfig::from_env();
                    output::print_message(&format!(
                        "{} CI #{} '{}'",
                        output::success("Created", &config),
                        ci.id,
                        ci.name
                    ))?;
                }
            }
        }
        CiAction::Show { id } => {
            let view = cmdb.view_ci(*id).await?;
            output::print_ci_view(&view, output_mode)?;
        }
        CiAction::Update(args) => {
            let updates = update_from_args(args);
            if updates.is_empty() {
                anyhow::bail!("No fields to update. Pass at least one of --name, --type, --status, --owner, --location, --description or a --clear-* flag");
            }
            let ci = cmdb.update_ci(args.id, updates).await?;
            app.save_or_reload().await?;
            output::print_ci(&ci, output_mode)?;
        }
        CiAction::Delete { id } => {
            let deleted = cmdb.delete_ci_with_cascade(*id).await?;
            app.save_or_reload().await?;
            output::print_deleted_ci(&deleted, output_mode)?;
        }
        CiAction::List(args) => {
            let cis = cmdb.list_cis(&query_from_args(args).to_filter()).await?;
            output::print_cis(&cis, output_mode)?;
        }
    }

    Ok(())
}

/// Execute a `rel` subcommand
pub async fn execute_rel(app: &App, action: &RelAction, output_mode: OutputMode) -> Result<()> {
    let cmdb = app.cmdb();

    match action {
        RelAction::Add {
            source,
            target,
            kind,
        } => {
            let new_rel = parse_new_relationship(*source, *target, kind)?;
            let rel = cmdb.create_relationship(new_rel).await?;
            app.save_or_reload().await?;
            output::print_relationship(&rel, output_mode)?;
        }
        RelAction::Show { id } => {
            let rel = cmdb.get_relationship(*id).await?;
            output::print_relationship(&rel, output_mode)?;
        }
        RelAction::Delete { id, ci } => {
            let removed = match ci {
                Some(ci) => cmdb.delete_relationship_for_ci(*id, *ci).await?,
                None => cmdb.delete_relationship(*id).await?,
            };
            app.save_or_reload().await?;
            match output_mode {
                OutputMode::Json => output::print_json(&removed)?,
                OutputMode::Text => {
                    let config = output::OutputConfig::from_env();
                    output::print_message(&format!(
                        "{} relationship #{}",
                        output::success("Deleted", &config),
                        removed.id
                    ))?;
                }
            }
        }
        RelAction::List { ci, direction } => {
            let query = RelationshipQuery {
                ci: *ci,
                direction: direction.clone(),
            };
            let (ci, direction) = query.resolve()?;
            let rels = cmdb.relationships_of(ci, direction).await?;
            output::print_relationships(&rels, direction, output_mode)?;
        }
    }

    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &ImpactArgs, output_mode: OutputMode) -> Result<()> {
    let cmdb = app.cmdb();
    let direction = Direction::from(args.walk);

    let root = cmdb.get_ci(args.id).await?;
    let steps = cmdb
        .traverse(args.id, direction, args.depth.map(usize::from))
        .await?;

    output::print_traversal(&root, &steps, direction, output_mode)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, output_mode: OutputMode) -> Result<()> {
    let counts = app.cmdb().counts().await?;
    output::print_counts(&counts, output_mode)?;
    Ok(())
}

/// Execute the import command
pub async fn execute_import(app: &App, file: &Path, output_mode: OutputMode) -> Result<()> {
    let imported = app.cmdb().import_file(file).await?;
    app.save_or_reload().await?;
    match output_mode {
        OutputMode::Json => output::print_json(&imported)?,
        OutputMode::Text => {
            let config = output::OutputConfig::from_env();
            output::print_message(&format!(
                "{} {} CI(s) and {} relationship(s) from {}",
                output::success("Imported", &config),
                imported.cis,
                imported.relationships,
                file.display()
            ))?;
        }
    }
    Ok(())
}

/// Execute the labels command
pub fn execute_labels(output_mode: OutputMode) -> Result<()> {
    output::print_labels(output_mode)?;
    Ok(())
}

fn new_ci_from_args(args: &CiAddArgs) -> NewConfigurationItem {
    NewConfigurationItem {
        name: args.name.clone(),
        ci_type: CiType::new(args.ci_type.as_str()),
        status: CiStatus::new(args.status.as_str()),
        owner: args.owner.clone(),
        location: args.location.clone(),
        description: args.description.clone(),
    }
}

fn update_from_args(args: &CiUpdateArgs) -> CiUpdate {
    fn optional(value: Option<&String>, clear: bool) -> Option<Option<String>> {
        if clear {
            Some(None)
        } else {
            value.map(|v| Some(v.clone()))
        }
    }

    CiUpdate {
        name: args.name.clone(),
        ci_type: args.ci_type.as_deref().map(CiType::new),
        status: args.status.as_deref().map(CiStatus::new),
        owner: optional(args.owner.as_ref(), args.clear_owner),
        location: optional(args.location.as_ref(), args.clear_location),
        description: optional(args.description.as_ref(), args.clear_description),
    }
}

fn query_from_args(args: &CiListArgs) -> CiQuery {
    CiQuery {
        name: args.name.clone(),
        ci_type: args.ci_type.clone(),
        status: args.status.clone(),
        owner: args.owner.clone(),
    }
}
