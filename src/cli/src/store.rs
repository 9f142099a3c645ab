//! Connection to the store the CLI operates on.

use anyhow::{Context, Result};
use pgrbac_core::config::{Config, DatabaseConfig};
use pgrbac_core::db::Database;
use pgrbac_core::telemetry::redact_url;
use pgrbac_core::Rbac;

/// A connected database plus the store over it.
pub struct Store {
    db: Database,
    rbac: Rbac,
    url: String,
}

impl Store {
    /// Connect using `--database-url`, falling back to the library
    /// configuration (`PGRBAC__DATABASE__*`, then `DATABASE_URL`).
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        let config = match database_url {
            Some(url) => DatabaseConfig::new(url),
            None => {
                Config::load()
                    .context("No database configured; pass --database-url or set DATABASE_URL")?
                    .database
            }
        };

        let db = Database::connect(&config)
            .await
            .with_context(|| format!("Could not connect to {}", redact_url(&config.url)))?;
        let rbac = Rbac::postgres(db.pool().clone());

        Ok(Self {
            db,
            rbac,
            url: config.url,
        })
    }

    pub fn rbac(&self) -> &Rbac {
        &self.rbac
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Connection URL with the password masked.
    pub fn display_url(&self) -> String {
        redact_url(&self.url)
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
