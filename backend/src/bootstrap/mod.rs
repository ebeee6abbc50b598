//! Startup wiring for schema bootstrap.

mod config;
mod startup;

pub use config::{SchemaBootstrapSettings, SettingsError};
pub use startup::{StartupSchemaError, ensure_schema_on_startup, ensure_schema_with};
