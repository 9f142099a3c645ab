//! In-process implementation of [`RbacBackend`].
//!
//! Mirrors the relational schema: three entity tables with serial ids and
//! unique names, two link sets keyed by id pairs, cascading deletes. A single
//! lock is held for the duration of each operation, which gives the same
//! per-operation atomicity the database provides.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::backend::RbacBackend;
use super::models::{EntityId, StoreStats};
use crate::error::Result;

/// One entity table: `id SERIAL PRIMARY KEY, name TEXT UNIQUE`.
#[derive(Debug, Default)]
struct EntityTable {
    next_id: i32,
    by_name: HashMap<String, EntityId>,
    by_id: BTreeMap<EntityId, String>,
}

impl EntityTable {
    fn lookup(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    /// Insert-or-ignore keyed on the name.
    fn ensure(&mut self, name: &str) -> EntityId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.by_name.insert(name.to_string(), id);
        self.by_id.insert(id, name.to_string());
        id
    }

    fn remove(&mut self, name: &str) -> Option<EntityId> {
        let id = self.by_name.remove(name)?;
        self.by_id.remove(&id);
        Some(id)
    }

    fn name(&self, id: EntityId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    fn len(&self) -> u64 {
        self.by_id.len() as u64
    }
}

#[derive(Debug, Default)]
struct Tables {
    roles: EntityTable,
    permissions: EntityTable,
    subjects: EntityTable,
    /// (role_id, permission_id)
    role_permissions: BTreeSet<(EntityId, EntityId)>,
    /// (subject_id, role_id)
    subject_roles: BTreeSet<(EntityId, EntityId)>,
}

impl Tables {
    fn roles_of(&self, subject_id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.subject_roles
            .range((subject_id, EntityId(i32::MIN))..=(subject_id, EntityId(i32::MAX)))
            .map(|&(_, role_id)| role_id)
    }

    fn permissions_of(&self, role_id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.role_permissions
            .range((role_id, EntityId(i32::MIN))..=(role_id, EntityId(i32::MAX)))
            .map(|&(_, permission_id)| permission_id)
    }

    fn sorted_names(table: &EntityTable, ids: impl Iterator<Item = EntityId>) -> Vec<String> {
        let names: BTreeSet<&str> = ids.filter_map(|id| table.name(id)).collect();
        names.into_iter().map(str::to_string).collect()
    }
}

/// RBAC store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RbacBackend for InMemoryBackend {
    async fn assign_permission_to_role(&self, permission: &str, role: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        let permission_id = tables.permissions.ensure(permission);
        let role_id = tables.roles.ensure(role);
        tables.role_permissions.insert((role_id, permission_id));
        Ok(())
    }

    async fn remove_permission_from_role(&self, permission: &str, role: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        let (Some(role_id), Some(permission_id)) =
            (tables.roles.lookup(role), tables.permissions.lookup(permission))
        else {
            return Ok(());
        };
        tables.role_permissions.remove(&(role_id, permission_id));
        Ok(())
    }

    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool> {
        let tables = self.tables.lock();
        Ok(
            match (tables.roles.lookup(role), tables.permissions.lookup(permission)) {
                (Some(role_id), Some(permission_id)) => {
                    tables.role_permissions.contains(&(role_id, permission_id))
                }
                _ => false,
            },
        )
    }

    async fn assign_role_to_subject(&self, role: &str, subject: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        let role_id = tables.roles.ensure(role);
        let subject_id = tables.subjects.ensure(subject);
        tables.subject_roles.insert((subject_id, role_id));
        Ok(())
    }

    async fn remove_role_from_subject(&self, role: &str, subject: &str) -> Result<()> {
        let mut tables = self.tables.lock();
        let (Some(role_id), Some(subject_id)) =
            (tables.roles.lookup(role), tables.subjects.lookup(subject))
        else {
            return Ok(());
        };
        tables.subject_roles.remove(&(subject_id, role_id));
        Ok(())
    }

    async fn subject_has_role(&self, subject: &str, role: &str) -> Result<bool> {
        let tables = self.tables.lock();
        Ok(
            match (tables.subjects.lookup(subject), tables.roles.lookup(role)) {
                (Some(subject_id), Some(role_id)) => {
                    tables.subject_roles.contains(&(subject_id, role_id))
                }
                _ => false,
            },
        )
    }

    async fn subject_has_permission(&self, subject: &str, permission: &str) -> Result<bool> {
        let tables = self.tables.lock();
        let (Some(subject_id), Some(permission_id)) =
            (tables.subjects.lookup(subject), tables.permissions.lookup(permission))
        else {
            return Ok(false);
        };
        let granted = tables
            .roles_of(subject_id)
            .any(|role_id| tables.role_permissions.contains(&(role_id, permission_id)));
        Ok(granted)
    }

    async fn delete_role(&self, role: &str) -> Result<bool> {
        let mut tables = self.tables.lock();
        let Some(role_id) = tables.roles.remove(role) else {
            return Ok(false);
        };
        tables.role_permissions.retain(|&(r, _)| r != role_id);
        tables.subject_roles.retain(|&(_, r)| r != role_id);
        Ok(true)
    }

    async fn delete_permission(&self, permission: &str) -> Result<bool> {
        let mut tables = self.tables.lock();
        let Some(permission_id) = tables.permissions.remove(permission) else {
            return Ok(false);
        };
        tables.role_permissions.retain(|&(_, p)| p != permission_id);
        Ok(true)
    }

    async fn delete_subject(&self, subject: &str) -> Result<bool> {
        let mut tables = self.tables.lock();
        let Some(subject_id) = tables.subjects.remove(subject) else {
            return Ok(false);
        };
        tables.subject_roles.retain(|&(s, _)| s != subject_id);
        Ok(true)
    }

    async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
        let tables = self.tables.lock();
        let Some(role_id) = tables.roles.lookup(role) else {
            return Ok(Vec::new());
        };
        let names = Tables::sorted_names(&tables.permissions, tables.permissions_of(role_id));
        Ok(names)
    }

    async fn subject_roles(&self, subject: &str) -> Result<Vec<String>> {
        let tables = self.tables.lock();
        let Some(subject_id) = tables.subjects.lookup(subject) else {
            return Ok(Vec::new());
        };
        let names = Tables::sorted_names(&tables.roles, tables.roles_of(subject_id));
        Ok(names)
    }

    async fn subject_permissions(&self, subject: &str) -> Result<Vec<String>> {
        let guard = self.tables.lock();
        let tables = &*guard;
        let Some(subject_id) = tables.subjects.lookup(subject) else {
            return Ok(Vec::new());
        };
        let permission_ids = tables
            .roles_of(subject_id)
            .flat_map(|role_id| tables.permissions_of(role_id));
        let names = Tables::sorted_names(&tables.permissions, permission_ids);
        Ok(names)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let tables = self.tables.lock();
        Ok(StoreStats {
            roles: tables.roles.len(),
            permissions: tables.permissions.len(),
            subjects: tables.subjects.len(),
            role_permissions: tables.role_permissions.len() as u64,
            subject_roles: tables.subject_roles.len() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_table_ids_are_serial_and_stable() {
        let mut table = EntityTable::default();
        let a = table.ensure("a");
        let b = table.ensure("b");
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));
        assert_eq!(table.ensure("a"), a);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_entity_table_ids_not_reused_after_remove() {
        let mut table = EntityTable::default();
        let a = table.ensure("a");
        assert_eq!(table.remove("a"), Some(a));
        assert_eq!(table.remove("a"), None);
        assert_eq!(table.ensure("a"), EntityId(2));
    }

    #[test]
    fn test_link_ranges_are_per_parent() {
        let mut tables = Tables::default();
        let s1 = tables.subjects.ensure("s1");
        let s2 = tables.subjects.ensure("s2");
        let r1 = tables.roles.ensure("r1");
        let r2 = tables.roles.ensure("r2");
        tables.subject_roles.insert((s1, r1));
        tables.subject_roles.insert((s2, r2));

        assert_eq!(tables.roles_of(s1).collect::<Vec<_>>(), vec![r1]);
        assert_eq!(tables.roles_of(s2).collect::<Vec<_>>(), vec![r2]);
    }

    #[tokio::test]
    async fn test_delete_role_cascades() {
        let backend = InMemoryBackend::new();
        backend.assign_permission_to_role("p", "r").await.unwrap();
        backend.assign_role_to_subject("r", "s").await.unwrap();

        assert!(backend.delete_role("r").await.unwrap());
        assert!(!backend.delete_role("r").await.unwrap());

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.roles, 0);
        assert_eq!(stats.role_permissions, 0);
        assert_eq!(stats.subject_roles, 0);
        assert_eq!(stats.permissions, 1);
        assert_eq!(stats.subjects, 1);
    }

    #[tokio::test]
    async fn test_subject_has_permission_through_role() {
        let backend = InMemoryBackend::new();
        backend.assign_permission_to_role("p", "r").await.unwrap();
        backend.assign_permission_to_role("q", "other").await.unwrap();
        backend.assign_role_to_subject("r", "s").await.unwrap();

        assert!(backend.subject_has_permission("s", "p").await.unwrap());
        assert!(!backend.subject_has_permission("s", "q").await.unwrap());
        assert!(!backend.subject_has_permission("s", "unknown").await.unwrap());
        assert!(!backend.subject_has_permission("unknown", "p").await.unwrap());
    }
}
