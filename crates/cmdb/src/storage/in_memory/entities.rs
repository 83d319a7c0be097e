//! Entity store: the set of configuration items.
//!
//! Owns CI records and the name index that enforces global name uniqueness.
//! It has no knowledge of relationships; removing a CI here never touches
//! edges; callers that delete CIs go through the cascade in `inner.rs`.

use crate::domain::{CiFilter, CiId, CiUpdate, ConfigurationItem, NewConfigurationItem};
use crate::error::{Error, Result, StorageError};
use chrono::Utc;
use std::collections::HashMap;

/// Configuration items indexed by id and by name.
#[derive(Debug)]
pub(crate) struct EntityTable {
    /// CIs indexed by ID for O(1) lookups
    items: HashMap<CiId, ConfigurationItem>,

    /// Name -> id. Every CI in `items` has exactly one entry here.
    names: HashMap<String, CiId>,

    /// Next id to hand out; only ever grows
    next_id: u64,
}

impl EntityTable {
    pub(crate) fn new() -> Self {
        Self {
            items: HashMap::new(),
            names: HashMap::new(),
            next_id: 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Raise the id counter to at least `next_id`.
    pub(crate) fn reserve_ids(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    pub(crate) fn contains(&self, id: CiId) -> bool {
        self.items.contains_key(&id)
    }

    pub(crate) fn get(&self, id: CiId) -> Result<&ConfigurationItem> {
        self.items.get(&id).ok_or(Error::CiNotFound(id))
    }

    /// Name of a CI, if it exists.
    pub(crate) fn name_of(&self, id: CiId) -> Option<&str> {
        self.items.get(&id).map(|ci| ci.name.as_str())
    }

    pub(crate) fn insert(&mut self, new_ci: NewConfigurationItem) -> Result<ConfigurationItem> {
        new_ci.validate()?;

        if self.names.contains_key(&new_ci.name) {
            return Err(Error::DuplicateName(new_ci.name));
        }

        let id = CiId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(StorageError::IdsExhausted("configuration item"))?;

        let ci = ConfigurationItem {
            id,
            name: new_ci.name,
            ci_type: new_ci.ci_type,
            status: new_ci.status,
            owner: new_ci.owner,
            location: new_ci.location,
            description: new_ci.description,
            last_updated: Utc::now(),
        };

        self.names.insert(ci.name.clone(), id);
        self.items.insert(id, ci.clone());
        Ok(ci)
    }

    /// Apply a partial update.
    ///
    /// The update is staged on a copy and only committed once validation and
    /// the uniqueness check pass, so a failed update leaves the record as it was.
    pub(crate) fn update(&mut self, id: CiId, updates: CiUpdate) -> Result<ConfigurationItem> {
        let current = self.get(id)?;
        let old_name = current.name.clone();

        let mut staged = current.clone();
        updates.apply_to(&mut staged);
        staged.validate()?;

        if staged.name != old_name {
            if let Some(&owner) = self.names.get(&staged.name) {
                if owner != id {
                    return Err(Error::DuplicateName(staged.name));
                }
            }
        }

        staged.last_updated = Utc::now();

        if staged.name != old_name {
            self.names.remove(&old_name);
            self.names.insert(staged.name.clone(), id);
        }
        self.items.insert(id, staged.clone());
        Ok(staged)
    }

    pub(crate) fn remove(&mut self, id: CiId) -> Result<ConfigurationItem> {
        let ci = self.items.remove(&id).ok_or(Error::CiNotFound(id))?;
        self.names.remove(&ci.name);
        Ok(ci)
    }

    /// CIs matching `filter`, ordered by name ascending.
    pub(crate) fn list(&self, filter: &CiFilter) -> Vec<ConfigurationItem> {
        let mut cis: Vec<ConfigurationItem> = self
            .items
            .values()
            .filter(|ci| filter.matches(ci))
            .cloned()
            .collect();
        cis.sort_by(|a, b| a.name.cmp(&b.name));
        cis
    }

    /// All CIs ordered by id.
    pub(crate) fn all_by_id(&self) -> Vec<ConfigurationItem> {
        let mut cis: Vec<ConfigurationItem> = self.items.values().cloned().collect();
        cis.sort_by_key(|ci| ci.id);
        cis
    }

    /// Insert an existing record (import path), keeping its id and timestamp.
    pub(crate) fn restore(&mut self, ci: ConfigurationItem) -> Result<()> {
        ci.validate()?;
        // The counter has to move past every stored id
        let after = ci.id.0.checked_add(1).ok_or_else(|| {
            Error::validation(format!("configuration item id {} is out of range", ci.id))
        })?;

        if self.items.contains_key(&ci.id) {
            return Err(Error::DuplicateConstraint(format!(
                "configuration item id {} is already in use",
                ci.id
            )));
        }
        if self.names.contains_key(&ci.name) {
            return Err(Error::DuplicateName(ci.name));
        }

        self.next_id = self.next_id.max(after);
        self.names.insert(ci.name.clone(), ci.id);
        self.items.insert(ci.id, ci);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CiStatus, CiType};

    fn server(name: &str) -> NewConfigurationItem {
        NewConfigurationItem::new(name, "Server", "Active")
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        let b = table.insert(server("b")).unwrap();
        assert_eq!(a.id, CiId(1));
        assert_eq!(b.id, CiId(2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        table.remove(a.id).unwrap();
        let b = table.insert(server("a")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let mut table = EntityTable::new();
        table.insert(server("WebServer-Prod-01")).unwrap();
        let err = table.insert(server("WebServer-Prod-01")).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "WebServer-Prod-01"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut table = EntityTable::new();
        table.insert(server("web")).unwrap();
        assert!(table.insert(server("WEB")).is_ok());
    }

    #[test]
    fn test_update_rename_to_taken_name_leaves_record_unchanged() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        table.insert(server("b")).unwrap();

        let err = table
            .update(
                a.id,
                CiUpdate {
                    name: Some("b".to_string()),
                    status: Some(CiStatus::new("Retired")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));

        let stored = table.get(a.id).unwrap();
        assert_eq!(stored, &a);
    }

    #[test]
    fn test_update_rename_frees_old_name() {
        let mut table = EntityTable::new();
        let a = table.insert(server("old")).unwrap();
        table
            .update(
                a.id,
                CiUpdate {
                    name: Some("new".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(table.insert(server("old")).is_ok());
        assert!(matches!(
            table.insert(server("new")),
            Err(Error::DuplicateName(_))
        ));
    }

    #[test]
    fn test_update_same_name_is_allowed() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        let updated = table
            .update(
                a.id,
                CiUpdate {
                    name: Some("a".to_string()),
                    ci_type: Some(CiType::new("Virtual Machine")),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.ci_type.as_str(), "Virtual Machine");
        assert!(updated.last_updated >= a.last_updated);
    }

    #[test]
    fn test_update_blank_status_is_rejected() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        let err = table
            .update(
                a.id,
                CiUpdate {
                    status: Some(CiStatus::new("")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(table.get(a.id).unwrap().status.as_str(), "Active");
    }

    #[test]
    fn test_update_missing_ci() {
        let mut table = EntityTable::new();
        let err = table.update(CiId(42), CiUpdate::default()).unwrap_err();
        assert!(matches!(err, Error::CiNotFound(CiId(42))));
    }

    #[test]
    fn test_list_orders_by_name() {
        let mut table = EntityTable::new();
        table.insert(server("charlie")).unwrap();
        table.insert(server("alpha")).unwrap();
        table.insert(server("bravo")).unwrap();

        let names: Vec<String> = table
            .list(&CiFilter::default())
            .into_iter()
            .map(|ci| ci.name)
            .collect();
        assert_eq!(names, ["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_restore_rejects_duplicate_id() {
        let mut table = EntityTable::new();
        let a = table.insert(server("a")).unwrap();
        let mut copy = a.clone();
        copy.name = "other".to_string();
        assert!(matches!(
            table.restore(copy),
            Err(Error::DuplicateConstraint(_))
        ));
    }

    #[test]
    fn test_restore_advances_id_counter() {
        let mut table = EntityTable::new();
        let mut source = EntityTable::new();
        let mut ci = source.insert(server("imported")).unwrap();
        ci.id = CiId(10);
        table.restore(ci).unwrap();
        assert_eq!(table.insert(server("fresh")).unwrap().id, CiId(11));
    }
}
