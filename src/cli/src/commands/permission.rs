//! Permission grant commands.
//!
//! Provides grant, revoke, check, and list operations for the permissions
//! carried by a role.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::store::Store;

#[derive(Subcommand)]
pub enum PermissionCommands {
    /// Grant a permission to a role, creating either if absent
    Grant {
        /// Permission name (e.g., service.component.create)
        permission: String,

        /// Role name (e.g., roles/service.componentAdmin)
        #[arg(short, long)]
        role: String,
    },

    /// Revoke a permission from a role
    Revoke {
        /// Permission name
        permission: String,

        /// Role name
        #[arg(short, long)]
        role: String,
    },

    /// Check whether a role carries a permission
    Check {
        /// Permission name
        permission: String,

        /// Role name
        #[arg(short, long)]
        role: String,
    },

    /// List the permissions carried by a role
    List {
        /// Role name
        #[arg(short, long)]
        role: String,
    },
}

#[derive(Debug, Serialize)]
struct RolePermissionCheck<'a> {
    role: &'a str,
    permission: &'a str,
    granted: bool,
}

pub async fn execute(cmd: PermissionCommands, store: &Store, format: OutputFormat) -> Result<()> {
    let rbac = store.rbac();

    match cmd {
        PermissionCommands::Grant { permission, role } => {
            rbac.assign_permission_to_role(&permission, &role).await?;
            output::print_success(&format!("Granted {} to {}", permission, role));
        }

        PermissionCommands::Revoke { permission, role } => {
            rbac.remove_permission_from_role(&permission, &role).await?;
            output::print_success(&format!("Revoked {} from {}", permission, role));
        }

        PermissionCommands::Check { permission, role } => {
            let granted = rbac.role_has_permission(&role, &permission).await?;
            let check = RolePermissionCheck {
                role: &role,
                permission: &permission,
                granted,
            };
            output::print_check(granted, &check, format)?;
        }

        PermissionCommands::List { role } => {
            let permissions = rbac.role_permissions(&role).await?;
            output::print_names(permissions, format)?;
        }
    }

    Ok(())
}
