//! Database health monitoring: migration validation, connectivity checks and
//! connection pool metrics.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::MIGRATOR;
use crate::error::{ErrorCode, RbacError, Result};

/// Connectivity checks slower than this are logged as a warning.
const HIGH_LATENCY: Duration = Duration::from_millis(100);

/// SQLSTATE `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

// ═══════════════════════════════════════════════════════════════════════════════
// Connection Pool Metrics
// ═══════════════════════════════════════════════════════════════════════════════

/// Metrics collected from the database connection pool.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionPoolMetrics {
    /// Total connections in the pool.
    pub pool_size: u32,
    /// Number of idle connections.
    pub idle_connections: u32,
    /// Number of active (in-use) connections.
    pub active_connections: u32,
    /// Maximum configured pool size.
    pub max_connections: u32,
    /// Pool utilization percentage.
    pub utilization_pct: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Migration Validation
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of migration validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MigrationValidationResult {
    /// Whether migrations are up to date.
    pub is_current: bool,
    /// Number of applied migrations.
    pub applied_count: usize,
    /// Number of pending migrations.
    pub pending_count: usize,
    /// Descriptions of pending migrations.
    pub pending_migrations: Vec<String>,
    /// Validation timestamp.
    pub validated_at: DateTime<Utc>,
}

impl MigrationValidationResult {
    /// Compare applied migration versions against the embedded migrator.
    fn compare(applied_versions: &[i64]) -> Self {
        let pending: Vec<String> = MIGRATOR
            .iter()
            .filter(|m| !applied_versions.contains(&m.version))
            .map(|m| format!("{}_{}", m.version, m.description))
            .collect();

        Self {
            is_current: pending.is_empty(),
            applied_count: applied_versions.len(),
            pending_count: pending.len(),
            pending_migrations: pending,
            validated_at: Utc::now(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Database Health Monitor
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs and validates migrations and checks that the store is reachable.
#[derive(Clone)]
pub struct DatabaseHealthMonitor {
    pool: PgPool,
    max_connections: u32,
}

impl DatabaseHealthMonitor {
    /// Create a new health monitor for the given pool.
    pub fn new(pool: PgPool, max_connections: u32) -> Self {
        Self {
            pool,
            max_connections,
        }
    }

    /// Run migrations with logging.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let start = Instant::now();
        MIGRATOR.run(&self.pool).await.map_err(|e| {
            error!(error = %e, "Database migration failed");
            RbacError::from(e)
        })?;
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Database migrations completed"
        );
        Ok(())
    }

    /// Validate that all embedded migrations are applied.
    pub async fn validate_migrations(&self) -> Result<MigrationValidationResult> {
        let applied: Vec<i64> = match sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(versions) => versions,
            // A database that was never migrated has no bookkeeping table.
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNDEFINED_TABLE) => {
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "Failed to read applied migrations");
                return Err(RbacError::from(e));
            }
        };

        let result = MigrationValidationResult::compare(&applied);

        if !result.is_current {
            warn!(
                pending_count = result.pending_count,
                "Database has pending migrations"
            );
        } else {
            info!(
                applied_count = result.applied_count,
                "All database migrations are applied"
            );
        }

        Ok(result)
    }

    /// Run startup validation: execute migrations, validate, and check connectivity.
    pub async fn startup_validation(&self) -> Result<()> {
        self.run_migrations().await?;

        let validation = self.validate_migrations().await?;
        if !validation.is_current {
            return Err(RbacError::new(
                ErrorCode::MigrationFailed,
                format!(
                    "Database has {} pending migrations after migration run",
                    validation.pending_count
                ),
            )
            .with_context("pending", &validation.pending_migrations));
        }

        self.check_connectivity().await?;

        info!("Database startup validation passed");
        Ok(())
    }

    /// Check database connectivity by executing a simple query.
    pub async fn check_connectivity(&self) -> Result<Duration> {
        let start = Instant::now();
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database connectivity check failed");
                RbacError::from(e)
            })?;
        let latency = start.elapsed();
        if latency > HIGH_LATENCY {
            warn!(
                latency_ms = latency.as_millis() as u64,
                "Database connectivity check latency is high"
            );
        }
        Ok(latency)
    }

    /// Get connection pool metrics.
    pub fn pool_metrics(&self) -> ConnectionPoolMetrics {
        let pool_size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        let active = pool_size.saturating_sub(idle);
        let utilization = if self.max_connections > 0 {
            (active as f64 / self.max_connections as f64) * 100.0
        } else {
            0.0
        };

        ConnectionPoolMetrics {
            pool_size,
            idle_connections: idle,
            active_connections: active,
            max_connections: self.max_connections,
            utilization_pct: utilization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_present() {
        assert!(MIGRATOR.iter().count() >= 1);
    }

    #[test]
    fn test_compare_reports_pending() {
        let result = MigrationValidationResult::compare(&[]);
        assert!(!result.is_current);
        assert_eq!(result.applied_count, 0);
        assert_eq!(result.pending_count, MIGRATOR.iter().count());
        assert!(result.pending_migrations[0].contains("create rbac tables"));
    }

    #[test]
    fn test_compare_all_applied() {
        let applied: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        let result = MigrationValidationResult::compare(&applied);
        assert!(result.is_current);
        assert!(result.pending_migrations.is_empty());
    }
}
