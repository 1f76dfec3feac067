//! Application configuration
//!
//! Loaded from a TOML file, by default
//! `<config dir>/pawnshop-transfers/config.toml`:
//!
//! ```toml
//! [database]
//! url = "sqlite://./pawnshop.db?mode=rwc"
//! max_connections = 10
//!
//! [logging]
//! level = "info"
//! format = "pretty"   # or "json"
//!
//! [transfers]
//! number_prefix = "TRF"
//! event_capacity = 1024
//! ```
//!
//! Every key is optional. `DATABASE_URL` overrides `database.url`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::transfer::DEFAULT_NUMBER_PREFIX;
use crate::infrastructure::database::{DatabaseConfig, DEFAULT_DATABASE_URL};
use crate::notifications::DEFAULT_CAPACITY;

/// Environment variable that overrides `database.url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub transfers: TransferSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSettings {
    /// URL to connect to, honouring `DATABASE_URL`
    pub fn connection_url(&self) -> String {
        self.resolve_url(std::env::var(DATABASE_URL_ENV).ok())
    }

    fn resolve_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.url.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "pawnshop_transfers=debug"
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    pub number_prefix: String,
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            number_prefix: DEFAULT_NUMBER_PREFIX.to_string(),
            event_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Read and parse the file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Connection settings with environment overrides applied
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.connection_url(),
            max_connections: self.database.max_connections.max(1),
        }
    }
}

/// `<config dir>/pawnshop-transfers/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("pawnshop-transfers"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}
