//! Domain layer for schema bootstrap.
//!
//! Purpose: own the static description of the timetable schema and the
//! idempotent procedure that brings a database up to it. Infrastructure is
//! reached only through the [`ports::SqlExecutor`] port.
//!
//! Public surface:
//! - `schema_catalog`: entity descriptors, trigger descriptors, plan
//!   validation.
//! - `SchemaEnsurer` and `ensure_database_schema`: the bootstrap procedure.

pub mod ports;
pub mod schema_catalog;
mod schema_ensure;

pub use self::schema_ensure::{
    EnsureOutcome, SchemaEnsureError, SchemaEnsureReport, SchemaEnsurer, TableOutcome,
    TriggerOutcome, ensure_database_schema,
};
