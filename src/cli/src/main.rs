//! pgrbac CLI - Command-line interface for a pgrbac store.
//!
//! Grants, revokes and checks permissions and roles directly against the
//! database, and applies the schema.

mod commands;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{delete, migrate, permission, role, stats, subject};
use output::OutputFormat;

/// pgrbac - PostgreSQL-backed role-based access control
#[derive(Parser)]
#[command(
    name = "pgrbac",
    author = "Aezi <aezi.zhu@icloud.com>",
    version = "0.1.0",
    about = "pgrbac - PostgreSQL-backed role-based access control",
    long_about = "CLI tool for granting, revoking and checking permissions, roles and subjects in a pgrbac store.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// PostgreSQL connection URL [default: PGRBAC__DATABASE__URL, then DATABASE_URL]
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the schema migrations
    Migrate,

    /// Permission grants on roles
    #[command(subcommand)]
    Permission(permission::PermissionCommands),

    /// Role grants on subjects
    #[command(subcommand)]
    Role(role::RoleCommands),

    /// Effective permissions of subjects
    #[command(subcommand)]
    Subject(subject::SubjectCommands),

    /// Delete a role, permission or subject with all of its grants
    #[command(subcommand)]
    Delete(delete::DeleteCommands),

    /// Show row counts of every relation
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let format = cli.output;

    let result = async move {
        let store = store::Store::connect(cli.database_url.as_deref()).await?;

        let result = match cli.command {
            Commands::Migrate => migrate::execute(&store, format).await,
            Commands::Permission(cmd) => permission::execute(cmd, &store, format).await,
            Commands::Role(cmd) => role::execute(cmd, &store, format).await,
            Commands::Subject(cmd) => subject::execute(cmd, &store, format).await,
            Commands::Delete(cmd) => delete::execute(cmd, &store, format).await,
            Commands::Stats => stats::execute(&store, format).await,
        };

        store.close().await;
        result
    }
    .await;

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
