//! Entry point: ensures the timetable schema exists, then exits.

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use timetable_backend::bootstrap::{SchemaBootstrapSettings, ensure_schema_on_startup};

fn main() -> Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = SchemaBootstrapSettings::load_from_iter(std::env::args_os())
        .map_err(|error| eyre!("load schema bootstrap configuration: {error}"))?;

    ensure_schema_on_startup(&settings).wrap_err("ensure database schema")?;
    Ok(())
}
