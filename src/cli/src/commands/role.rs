//! Role grant commands.
//!
//! Provides assign, remove, check, and list operations for the roles held by
//! a subject.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::store::Store;

#[derive(Subcommand)]
pub enum RoleCommands {
    /// Assign a role to a subject, creating either if absent
    Assign {
        /// Role name (e.g., roles/service.componentAdmin)
        role: String,

        /// Subject name (e.g., user:example@example.com)
        #[arg(short, long)]
        subject: String,
    },

    /// Remove a role from a subject
    Remove {
        /// Role name
        role: String,

        /// Subject name
        #[arg(short, long)]
        subject: String,
    },

    /// Check whether a subject holds a role
    Check {
        /// Role name
        role: String,

        /// Subject name
        #[arg(short, long)]
        subject: String,
    },

    /// List the roles held by a subject
    List {
        /// Subject name
        #[arg(short, long)]
        subject: String,
    },
}

#[derive(Debug, Serialize)]
struct SubjectRoleCheck<'a> {
    subject: &'a str,
    role: &'a str,
    granted: bool,
}

pub async fn execute(cmd: RoleCommands, store: &Store, format: OutputFormat) -> Result<()> {
    let rbac = store.rbac();

    match cmd {
        RoleCommands::Assign { role, subject } => {
            rbac.assign_role_to_subject(&role, &subject).await?;
            output::print_success(&format!("Assigned {} to {}", role, subject));
        }

        RoleCommands::Remove { role, subject } => {
            rbac.remove_role_from_subject(&role, &subject).await?;
            output::print_success(&format!("Removed {} from {}", role, subject));
        }

        RoleCommands::Check { role, subject } => {
            let granted = rbac.subject_has_role(&subject, &role).await?;
            let check = SubjectRoleCheck {
                subject: &subject,
                role: &role,
                granted,
            };
            output::print_check(granted, &check, format)?;
        }

        RoleCommands::List { subject } => {
            let roles = rbac.subject_roles(&subject).await?;
            output::print_names(roles, format)?;
        }
    }

    Ok(())
}
