//! Effective permission commands for subjects.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::store::Store;

#[derive(Subcommand)]
pub enum SubjectCommands {
    /// Check whether a subject holds a permission through any of its roles
    Can {
        /// Subject name (e.g., user:example@example.com)
        subject: String,

        /// Permission name (e.g., service.component.create)
        permission: String,
    },

    /// List every permission a subject holds through its roles
    Permissions {
        /// Subject name
        subject: String,
    },
}

#[derive(Debug, Serialize)]
struct SubjectPermissionCheck<'a> {
    subject: &'a str,
    permission: &'a str,
    granted: bool,
}

pub async fn execute(cmd: SubjectCommands, store: &Store, format: OutputFormat) -> Result<()> {
    let rbac = store.rbac();

    match cmd {
        SubjectCommands::Can { subject, permission } => {
            let granted = rbac.subject_has_permission(&subject, &permission).await?;
            let check = SubjectPermissionCheck {
                subject: &subject,
                permission: &permission,
                granted,
            };
            output::print_check(granted, &check, format)?;
        }

        SubjectCommands::Permissions { subject } => {
            let permissions = rbac.subject_permissions(&subject).await?;
            output::print_names(permissions, format)?;
        }
    }

    Ok(())
}
