//! Startup schema bootstrap orchestration.

use thiserror::Error;
use tracing::info;

use crate::bootstrap::config::{SchemaBootstrapSettings, SettingsError};
use crate::domain::ports::{SqlExecutor, SqlExecutorError};
use crate::domain::{SchemaEnsureError, SchemaEnsureReport, ensure_database_schema};
use crate::outbound::persistence::PostgresSqlExecutor;

/// Errors returned while bootstrapping the schema at startup.
#[derive(Debug, Error)]
pub enum StartupSchemaError {
    /// Configuration is incomplete.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The database could not be reached.
    #[error(transparent)]
    Connect(SqlExecutorError),
    /// A bootstrap step failed; objects created before it remain.
    #[error(transparent)]
    Ensure(#[from] SchemaEnsureError),
}

/// Connect using `settings` and ensure the schema.
///
/// # Examples
///
/// ```rust,no_run
/// use timetable_backend::bootstrap::{SchemaBootstrapSettings, ensure_schema_on_startup};
///
/// let settings = SchemaBootstrapSettings::for_url("postgres://postgres@localhost/timetable");
/// let report = ensure_schema_on_startup(&settings)?;
/// assert_eq!(report.tables.len(), 6);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn ensure_schema_on_startup(
    settings: &SchemaBootstrapSettings,
) -> Result<SchemaEnsureReport, StartupSchemaError> {
    let database_url = settings.database_url()?;
    let executor =
        PostgresSqlExecutor::connect_with_timeout(database_url, settings.connect_timeout())
            .map_err(StartupSchemaError::Connect)?;
    ensure_schema_with(executor)
}

/// Ensure the schema on an already established executor.
pub fn ensure_schema_with<E: SqlExecutor>(
    executor: E,
) -> Result<SchemaEnsureReport, StartupSchemaError> {
    let report = ensure_database_schema(executor)?;

    if report.is_unchanged() {
        info!(reason = "up to date", "schema bootstrap made no changes");
    } else {
        info!(
            created_tables = report.created_tables(),
            created_triggers = report.created_triggers(),
            "schema bootstrap applied"
        );
    }
    Ok(report)
}
