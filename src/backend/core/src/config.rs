//! Configuration management.
//!
//! Values are read from (highest priority first):
//! 1. `PGRBAC__*` environment variables, e.g. `PGRBAC__DATABASE__URL`
//! 2. An optional configuration file (see [`Config::from_file`])
//! 3. `DATABASE_URL`, as a fallback for `database.url`

use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;
use crate::telemetry::logging::LoggingConfig;

/// Environment variable prefix for all settings.
pub const ENV_PREFIX: &str = "PGRBAC";

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Deployment environment (development, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Build a config for `url` with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

// Default value functions
fn default_environment() -> String { "production".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_acquire_timeout_secs() -> u64 { 5 }

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = Self::builder()?
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Self::builder()?
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = config::Config::builder();
        let builder = match std::env::var("DATABASE_URL") {
            Ok(url) => builder.set_default("database.url", url)?,
            Err(_) => builder,
        };
        Ok(builder)
    }
}
