//! PostgreSQL implementation of [`RbacBackend`].
//!
//! Consistency is left entirely to the database: entity and link inserts use
//! `ON CONFLICT ... DO NOTHING` against the natural unique keys, so concurrent
//! identical calls converge on one row without application-side locking.
//! Boolean checks are single `EXISTS` queries over the join.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::backend::RbacBackend;
use super::models::{EntityId, EntityKind, StoreStats};
use crate::error::{ErrorCode, RbacError, Result};

/// RBAC store over the schema in `migrations/`.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    roles: i64,
    permissions: i64,
    subjects: i64,
    role_permissions: i64,
    subject_roles: i64,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Identifier of the entity named `name`, if it exists.
    async fn lookup(&self, kind: EntityKind, name: &str) -> Result<Option<EntityId>> {
        let sql = format!("SELECT id FROM {} WHERE name = $1", kind.table());

        let id: Option<i32> = sqlx::query_scalar(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.map(EntityId))
    }

    /// Create the entity if absent and return its identifier.
    ///
    /// The insert and the lookup are separate statements so the lookup sees
    /// rows committed by a concurrent inserter that won the conflict.
    async fn ensure(&self, kind: EntityKind, name: &str) -> Result<EntityId> {
        let sql = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
            kind.table()
        );

        sqlx::query(&sql).bind(name).execute(&self.pool).await?;

        // Only a concurrent delete between the two statements gets here.
        self.lookup(kind, name).await?.ok_or_else(|| {
            RbacError::new(
                ErrorCode::ConstraintViolation,
                format!("{} was deleted while being assigned: {}", kind, name),
            )
        })
    }

    async fn delete(&self, kind: EntityKind, name: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE name = $1", kind.table());

        let result = sqlx::query(&sql).bind(name).execute(&self.pool).await?;
        let deleted = result.rows_affected() > 0;
        debug!(kind = %kind, name = name, deleted, "Deleted entity");
        Ok(deleted)
    }
}

#[async_trait]
impl RbacBackend for PostgresBackend {
    async fn assign_permission_to_role(&self, permission: &str, role: &str) -> Result<()> {
        let (permission_id, role_id) = tokio::try_join!(
            self.ensure(EntityKind::Permission, permission),
            self.ensure(EntityKind::Role, role),
        )?;

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.0)
        .bind(permission_id.0)
        .execute(&self.pool)
        .await?;

        debug!(permission, role, "Assigned permission to role");
        Ok(())
    }

    async fn remove_permission_from_role(&self, permission: &str, role: &str) -> Result<()> {
        let (role_id, permission_id) = tokio::try_join!(
            self.lookup(EntityKind::Role, role),
            self.lookup(EntityKind::Permission, permission),
        )?;

        let (Some(role_id), Some(permission_id)) = (role_id, permission_id) else {
            return Ok(());
        };

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(role_id.0)
            .bind(permission_id.0)
            .execute(&self.pool)
            .await?;

        debug!(permission, role, "Removed permission from role");
        Ok(())
    }

    async fn role_has_permission(&self, role: &str, permission: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_permissions rp
                JOIN roles r ON r.id = rp.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE r.name = $1 AND p.name = $2
            )
            "#,
        )
        .bind(role)
        .bind(permission)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn assign_role_to_subject(&self, role: &str, subject: &str) -> Result<()> {
        let (role_id, subject_id) = tokio::try_join!(
            self.ensure(EntityKind::Role, role),
            self.ensure(EntityKind::Subject, subject),
        )?;

        sqlx::query(
            r#"
            INSERT INTO subject_roles (subject_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (subject_id, role_id) DO NOTHING
            "#,
        )
        .bind(subject_id.0)
        .bind(role_id.0)
        .execute(&self.pool)
        .await?;

        debug!(role, subject, "Assigned role to subject");
        Ok(())
    }

    async fn remove_role_from_subject(&self, role: &str, subject: &str) -> Result<()> {
        let (role_id, subject_id) = tokio::try_join!(
            self.lookup(EntityKind::Role, role),
            self.lookup(EntityKind::Subject, subject),
        )?;

        let (Some(role_id), Some(subject_id)) = (role_id, subject_id) else {
            return Ok(());
        };

        sqlx::query("DELETE FROM subject_roles WHERE subject_id = $1 AND role_id = $2")
            .bind(subject_id.0)
            .bind(role_id.0)
            .execute(&self.pool)
            .await?;

        debug!(role, subject, "Removed role from subject");
        Ok(())
    }

    async fn subject_has_role(&self, subject: &str, role: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM subject_roles sr
                JOIN subjects s ON s.id = sr.subject_id
                JOIN roles r ON r.id = sr.role_id
                WHERE s.name = $1 AND r.name = $2
            )
            "#,
        )
        .bind(subject)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn subject_has_permission(&self, subject: &str, permission: &str) -> Result<bool> {
        let (subject_id, permission_id) = tokio::try_join!(
            self.lookup(EntityKind::Subject, subject),
            self.lookup(EntityKind::Permission, permission),
        )?;

        let (Some(subject_id), Some(permission_id)) = (subject_id, permission_id) else {
            return Ok(false);
        };

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM subject_roles sr
                JOIN roles r ON r.id = sr.role_id
                JOIN role_permissions rp ON rp.role_id = r.id
                WHERE sr.subject_id = $1 AND rp.permission_id = $2
            )
            "#,
        )
        .bind(subject_id.0)
        .bind(permission_id.0)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete_role(&self, role: &str) -> Result<bool> {
        self.delete(EntityKind::Role, role).await
    }

    async fn delete_permission(&self, permission: &str) -> Result<bool> {
        self.delete(EntityKind::Permission, permission).await
    }

    async fn delete_subject(&self, subject: &str) -> Result<bool> {
        self.delete(EntityKind::Subject, subject).await
    }

    async fn role_permissions(&self, role: &str) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM role_permissions rp
            JOIN roles r ON r.id = rp.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE r.name = $1
            ORDER BY p.name COLLATE "C"
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn subject_roles(&self, subject: &str) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM subject_roles sr
            JOIN subjects s ON s.id = sr.subject_id
            JOIN roles r ON r.id = sr.role_id
            WHERE s.name = $1
            ORDER BY r.name COLLATE "C"
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn subject_permissions(&self, subject: &str) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name COLLATE "C" AS name
            FROM subjects s
            JOIN subject_roles sr ON sr.subject_id = s.id
            JOIN role_permissions rp ON rp.role_id = sr.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE s.name = $1
            ORDER BY 1
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM roles) AS roles,
                (SELECT COUNT(*) FROM permissions) AS permissions,
                (SELECT COUNT(*) FROM subjects) AS subjects,
                (SELECT COUNT(*) FROM role_permissions) AS role_permissions,
                (SELECT COUNT(*) FROM subject_roles) AS subject_roles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            roles: row.roles as u64,
            permissions: row.permissions as u64,
            subjects: row.subjects as u64,
            role_permissions: row.role_permissions as u64,
            subject_roles: row.subject_roles as u64,
        })
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
