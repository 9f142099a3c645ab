//! Role-Based Access Control store.
//!
//! Permissions are granted to roles and roles are granted to subjects. The
//! store answers two questions: does a role carry a permission, and does a
//! subject carry it through any of its roles (one hop, no role hierarchy).
//!
//! This module provides:
//! - **Rbac**: the typed store, generic over the permission, role and subject
//!   name types
//! - **RbacBackend**: the storage seam, with PostgreSQL and in-memory
//!   implementations
//! - **rbac_names!**: closed name sets for compile-time checked names
//!
//! # Usage
//!
//! ```rust,ignore
//! use pgrbac_core::rbac::Rbac;
//!
//! let rbac = Rbac::postgres(db.pool().clone());
//!
//! rbac.assign_permission_to_role("service.component.create", "roles/service.componentAdmin").await?;
//! rbac.assign_role_to_subject("roles/service.componentAdmin", "user:example@example.com").await?;
//!
//! assert!(rbac.subject_has_permission("user:example@example.com", "service.component.create").await?);
//! ```

pub mod backend;
pub mod memory;
pub mod models;
pub mod postgres;

pub use backend::RbacBackend;
pub use memory::InMemoryBackend;
pub use models::{EntityId, EntityKind, RbacName, StoreStats};
pub use postgres::PostgresBackend;

use sqlx::PgPool;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::error::Result;
use crate::telemetry::metrics::{OperationMetrics, Outcome};

/// The RBAC store.
///
/// `P`, `R` and `S` are the permission, role and subject name types. They
/// default to `str`; use [`rbac_names!`](crate::rbac_names) enums to restrict
/// callers to a closed set. The name types only affect the API, never the
/// stored data.
///
/// Storage failures are returned to the caller unchanged and are not logged
/// or retried here.
pub struct Rbac<P: ?Sized = str, R: ?Sized = str, S: ?Sized = str> {
    backend: Arc<dyn RbacBackend>,
    _names: PhantomData<fn(&P, &R, &S)>,
}

impl<P: ?Sized, R: ?Sized, S: ?Sized> Clone for Rbac<P, R, S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _names: PhantomData,
        }
    }
}

impl<P: ?Sized, R: ?Sized, S: ?Sized> std::fmt::Debug for Rbac<P, R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rbac")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl<P, R, S> Rbac<P, R, S>
where
    P: RbacName + ?Sized,
    R: RbacName + ?Sized,
    S: RbacName + ?Sized,
{
    /// Create a store over any backend.
    pub fn new(backend: Arc<dyn RbacBackend>) -> Self {
        Self {
            backend,
            _names: PhantomData,
        }
    }

    /// Create a store over a PostgreSQL pool with the schema applied.
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PostgresBackend::new(pool)))
    }

    /// Create an empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// The underlying backend.
    pub fn backend(&self) -> &dyn RbacBackend {
        self.backend.as_ref()
    }

    /// A view of the same store with different name types.
    pub fn retyped<P2, R2, S2>(&self) -> Rbac<P2, R2, S2>
    where
        P2: RbacName + ?Sized,
        R2: RbacName + ?Sized,
        S2: RbacName + ?Sized,
    {
        Rbac::new(Arc::clone(&self.backend))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission -> Role
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `permission` to `role`, creating either if absent. Idempotent.
    pub async fn assign_permission_to_role(&self, permission: &P, role: &R) -> Result<()> {
        self.observe(
            "assign_permission_to_role",
            self.backend
                .assign_permission_to_role(permission.rbac_name(), role.rbac_name()),
        )
        .await
    }

    /// Revoke `permission` from `role`. A no-op when either is unknown or
    /// they are not linked.
    pub async fn remove_permission_from_role(&self, permission: &P, role: &R) -> Result<()> {
        self.observe(
            "remove_permission_from_role",
            self.backend
                .remove_permission_from_role(permission.rbac_name(), role.rbac_name()),
        )
        .await
    }

    pub async fn role_has_permission(&self, role: &R, permission: &P) -> Result<bool> {
        self.observe(
            "role_has_permission",
            self.backend
                .role_has_permission(role.rbac_name(), permission.rbac_name()),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role -> Subject
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `role` to `subject`, creating either if absent. Idempotent.
    pub async fn assign_role_to_subject(&self, role: &R, subject: &S) -> Result<()> {
        self.observe(
            "assign_role_to_subject",
            self.backend
                .assign_role_to_subject(role.rbac_name(), subject.rbac_name()),
        )
        .await
    }

    /// Revoke `role` from `subject`. A no-op when either is unknown or they
    /// are not linked.
    pub async fn remove_role_from_subject(&self, role: &R, subject: &S) -> Result<()> {
        self.observe(
            "remove_role_from_subject",
            self.backend
                .remove_role_from_subject(role.rbac_name(), subject.rbac_name()),
        )
        .await
    }

    pub async fn subject_has_role(&self, subject: &S, role: &R) -> Result<bool> {
        self.observe(
            "subject_has_role",
            self.backend
                .subject_has_role(subject.rbac_name(), role.rbac_name()),
        )
        .await
    }

    /// Whether `subject` holds any role that carries `permission`.
    ///
    /// `false` when either name was never registered.
    pub async fn subject_has_permission(&self, subject: &S, permission: &P) -> Result<bool> {
        self.observe(
            "subject_has_permission",
            self.backend
                .subject_has_permission(subject.rbac_name(), permission.rbac_name()),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete a role together with all of its grants.
    pub async fn delete_role(&self, role: &R) -> Result<bool> {
        self.observe("delete_role", self.backend.delete_role(role.rbac_name()))
            .await
    }

    /// Delete a permission together with all of its grants.
    pub async fn delete_permission(&self, permission: &P) -> Result<bool> {
        self.observe(
            "delete_permission",
            self.backend.delete_permission(permission.rbac_name()),
        )
        .await
    }

    /// Delete a subject together with all of its role grants.
    pub async fn delete_subject(&self, subject: &S) -> Result<bool> {
        self.observe(
            "delete_subject",
            self.backend.delete_subject(subject.rbac_name()),
        )
        .await
    }

    pub async fn role_permissions(&self, role: &R) -> Result<Vec<String>> {
        self.observe(
            "role_permissions",
            self.backend.role_permissions(role.rbac_name()),
        )
        .await
    }

    pub async fn subject_roles(&self, subject: &S) -> Result<Vec<String>> {
        self.observe(
            "subject_roles",
            self.backend.subject_roles(subject.rbac_name()),
        )
        .await
    }

    /// The effective permission set of `subject`.
    pub async fn subject_permissions(&self, subject: &S) -> Result<Vec<String>> {
        self.observe(
            "subject_permissions",
            self.backend.subject_permissions(subject.rbac_name()),
        )
        .await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.observe("stats", self.backend.stats()).await
    }

    async fn observe<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let backend = self.backend.name();
        let start = Instant::now();
        let result = fut
            .instrument(tracing::debug_span!("rbac", operation, backend))
            .await;
        let outcome = if result.is_ok() {
            Outcome::Ok
        } else {
            Outcome::Error
        };
        OperationMetrics::record(operation, backend, outcome, start.elapsed());
        result
    }
}
