#![allow(clippy::result_large_err)]
//! # pgrbac Core
//!
//! Role-based access control backed by PostgreSQL.
//!
//! ## Architecture
//!
//! - **RBAC**: Permissions granted to roles, roles granted to subjects, one-hop checks
//! - **Database**: Connection pooling, embedded migrations and startup validation
//! - **Telemetry**: Structured logging with credential redaction, per-operation metrics
//! - **Config**: Layered configuration from files and the environment

pub mod config;
pub mod db;
pub mod error;
pub mod rbac;
pub mod telemetry;

pub use error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, RbacError, Result};
pub use rbac::Rbac;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig};
    pub use crate::db::{health::DatabaseHealthMonitor, Database};
    pub use crate::error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, RbacError, Result};
    pub use crate::rbac::{
        EntityId, EntityKind, InMemoryBackend, PostgresBackend, Rbac, RbacBackend, RbacName,
        StoreStats,
    };
    pub use crate::rbac_names;
}
