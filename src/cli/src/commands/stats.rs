//! Store statistics command.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use crate::store::Store;

#[derive(Debug, Serialize, Tabled)]
struct RelationRow {
    #[tabled(rename = "Relation")]
    relation: &'static str,
    #[tabled(rename = "Rows")]
    rows: u64,
}

pub async fn execute(store: &Store, format: OutputFormat) -> Result<()> {
    let stats = store.rbac().stats().await?;

    match format {
        OutputFormat::Table => {
            output::print_header(&format!("Store: {}", store.display_url()));
            let rows = [
                RelationRow { relation: "roles", rows: stats.roles },
                RelationRow { relation: "permissions", rows: stats.permissions },
                RelationRow { relation: "subjects", rows: stats.subjects },
                RelationRow { relation: "role_permissions", rows: stats.role_permissions },
                RelationRow { relation: "subject_roles", rows: stats.subject_roles },
            ];
            output::print_list(&rows, format)?;
        }
        _ => output::print_item(&stats, format)?,
    }

    Ok(())
}
