//! Subcommand implementations.

pub mod delete;
pub mod migrate;
pub mod permission;
pub mod role;
pub mod stats;
pub mod subject;
