//! Schema bootstrap configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors detected after loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// No usable connection URL was supplied.
    #[error("database URL is not configured; set SCHEMA_DATABASE_URL or pass --database-url")]
    MissingDatabaseUrl,
}

/// Configuration values for the `ensure-schema` entry point.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCHEMA")]
pub struct SchemaBootstrapSettings {
    /// PostgreSQL connection URL of the database to bootstrap.
    pub database_url: Option<String>,
    /// Seconds to wait for the connection when the URL sets no
    /// `connect_timeout` of its own.
    #[ortho_config(default = 10)]
    pub connect_timeout_secs: u64,
}

impl SchemaBootstrapSettings {
    /// Settings pointing at `database_url` with the default connect timeout.
    pub fn for_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            connect_timeout_secs: 10,
        }
    }

    /// Return the configured connection URL.
    ///
    /// Blank values count as missing.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Connect timeout applied when the URL carries none.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
