//! Schema migration command.

use anyhow::Result;
use pgrbac_core::db::health::DatabaseHealthMonitor;

use crate::output::{self, OutputFormat};
use crate::store::Store;

pub async fn execute(store: &Store, format: OutputFormat) -> Result<()> {
    let pool = store.db().pool();
    let monitor = DatabaseHealthMonitor::new(pool.clone(), pool.options().get_max_connections());

    monitor.startup_validation().await?;
    let validation = monitor.validate_migrations().await?;

    match format {
        OutputFormat::Table => {
            output::print_success(&format!("Database at {} is migrated", store.display_url()));
            output::print_info(&format!("{} migrations applied", validation.applied_count));
        }
        _ => output::print_item(&validation, format)?,
    }

    Ok(())
}
