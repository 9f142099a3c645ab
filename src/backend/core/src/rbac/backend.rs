//! Storage seam for the RBAC store.

use async_trait::async_trait;

use super::models::StoreStats;
use crate::error::Result;

/// A string-keyed RBAC relation store.
///
/// Every mutation is idempotent, and unknown names are never errors: checks
/// return `false`, removals do nothing and listings are empty. The only
/// errors are storage failures.
#[async_trait]
pub trait RbacBackend: Send + Sync {
    /// Ensure `permission` and `role` exist and are linked.
    async fn assign_permission_to_role(&self, permission: &str, role: &str) -> Result<()>;

    /// Remove the link between `permission` and `role`, if any.
    async fn remove_permission_from_role(&self, permission: &str, role: &str) -> Result<()>;

    /// Whether `role` carries `permission`.
    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool>;

    /// Ensure `role` and `subject` exist and are linked.
    async fn assign_role_to_subject(&self, role: &str, subject: &str) -> Result<()>;

    /// Remove the link between `role` and `subject`, if any.
    async fn remove_role_from_subject(&self, role: &str, subject: &str) -> Result<()>;

    /// Whether `subject` holds `role`.
    async fn subject_has_role(&self, subject: &str, role: &str) -> Result<bool>;

    /// Whether any role held by `subject` carries `permission`.
    async fn subject_has_permission(&self, subject: &str, permission: &str) -> Result<bool>;

    /// Delete a role and, by cascade, all of its links.
    async fn delete_role(&self, role: &str) -> Result<bool>;

    /// Delete a permission and, by cascade, all of its links.
    async fn delete_permission(&self, permission: &str) -> Result<bool>;

    /// Delete a subject and, by cascade, all of its links.
    async fn delete_subject(&self, subject: &str) -> Result<bool>;

    /// Permissions granted to `role`, sorted by name.
    async fn role_permissions(&self, role: &str) -> Result<Vec<String>>;

    /// Roles granted to `subject`, sorted by name.
    async fn subject_roles(&self, subject: &str) -> Result<Vec<String>>;

    /// Effective permissions of `subject` across all of its roles, sorted and
    /// de-duplicated.
    async fn subject_permissions(&self, subject: &str) -> Result<Vec<String>>;

    /// Row counts of every relation.
    async fn stats(&self) -> Result<StoreStats>;

    /// Backend name, used as a metrics label.
    fn name(&self) -> &'static str;
}
