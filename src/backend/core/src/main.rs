//! pgrbac-migrate - applies the RBAC schema to the configured database.
//!
//! Exits non-zero when the database is unreachable or a migration fails.

use pgrbac_core::{
    config::Config,
    db::{health::DatabaseHealthMonitor, Database},
    telemetry, Result,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    telemetry::init_logging(&config.logging, &config.environment)?;
    telemetry::describe_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting pgrbac-migrate"
    );

    if let Err(e) = migrate(&config).await {
        e.log();
        return Err(e.into());
    }

    tracing::info!("Finished migrating database");
    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    let db = Database::connect(&config.database).await?;

    let monitor = DatabaseHealthMonitor::new(db.pool().clone(), config.database.max_connections);
    let result = monitor.startup_validation().await;

    db.close().await;
    result
}
