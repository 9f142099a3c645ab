//! Entity deletion commands.
//!
//! Deleting an entity removes every grant that references it.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::store::Store;

#[derive(Subcommand)]
pub enum DeleteCommands {
    /// Delete a role
    Role {
        /// Role name
        name: String,
    },

    /// Delete a permission
    Permission {
        /// Permission name
        name: String,
    },

    /// Delete a subject
    Subject {
        /// Subject name
        name: String,
    },
}

#[derive(Debug, Serialize)]
struct DeleteResult<'a> {
    kind: &'static str,
    name: &'a str,
    deleted: bool,
}

pub async fn execute(cmd: DeleteCommands, store: &Store, format: OutputFormat) -> Result<()> {
    let rbac = store.rbac();

    let (kind, name, deleted) = match &cmd {
        DeleteCommands::Role { name } => ("role", name, rbac.delete_role(name).await?),
        DeleteCommands::Permission { name } => {
            ("permission", name, rbac.delete_permission(name).await?)
        }
        DeleteCommands::Subject { name } => ("subject", name, rbac.delete_subject(name).await?),
    };

    match format {
        OutputFormat::Table if deleted => {
            output::print_success(&format!("Deleted {} {}", kind, name));
        }
        OutputFormat::Table => {
            output::print_info(&format!("No {} named {}", kind, name));
        }
        _ => output::print_item(&DeleteResult { kind, name, deleted }, format)?,
    }

    Ok(())
}
