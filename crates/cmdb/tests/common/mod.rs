//! Shared helpers for integration tests.

#![allow(dead_code)]

use cmdb::Cmdb;
use cmdb::domain::{
    CiId, ConfigurationItem, NewConfigurationItem, NewRelationship, Relationship, RelationshipType,
};

/// A new active CI of the given type.
pub fn new_ci(name: &str, ci_type: &str) -> NewConfigurationItem {
    NewConfigurationItem::new(name, ci_type, "Active")
}

/// Create a CI, panicking on failure.
pub async fn add_ci(cmdb: &Cmdb, name: &str, ci_type: &str) -> ConfigurationItem {
    cmdb.create_ci(new_ci(name, ci_type))
        .await
        .unwrap_or_else(|e| panic!("Failed to create CI '{name}': {e}"))
}

/// Create a relationship and return the stored edge.
pub async fn link(
    cmdb: &Cmdb,
    source: CiId,
    target: CiId,
    relationship_type: RelationshipType,
) -> Relationship {
    let view = cmdb
        .create_relationship(NewRelationship::new(source, target, relationship_type))
        .await
        .unwrap_or_else(|e| panic!("Failed to link {source} -> {target}: {e}"));
    Relationship {
        id: view.id,
        source_id: view.source_id,
        target_id: view.target_id,
        relationship_type: view.relationship_type,
    }
}

/// A small web stack:
///
/// ```text
/// web -[Depends on]-> app -[Depends on]-> db
///                     app -[Runs on]----> vm
/// ```
pub struct WebStack {
    pub web: ConfigurationItem,
    pub app: ConfigurationItem,
    pub db: ConfigurationItem,
    pub vm: ConfigurationItem,
}

pub async fn web_stack(cmdb: &Cmdb) -> WebStack {
    let web = add_ci(cmdb, "WebServer-Prod-01", "Server").await;
    let app = add_ci(cmdb, "BillingApp-Prod", "Application").await;
    let db = add_ci(cmdb, "CustomerDB-Prod-01", "Database").await;
    let vm = add_ci(cmdb, "VM-Prod-17", "Virtual Machine").await;

    link(cmdb, web.id, app.id, RelationshipType::DependsOn).await;
    link(cmdb, app.id, db.id, RelationshipType::DependsOn).await;
    link(cmdb, app.id, vm.id, RelationshipType::RunsOn).await;

    WebStack { web, app, db, vm }
}
