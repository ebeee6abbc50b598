//! Idempotent schema bootstrap for the timetable and attendance backend.
//!
//! The crate ensures the entity tables, lookup indexes, constraints, and
//! `updated_at` triggers exist, creating only what is missing. It is not a
//! migration framework: there is no versioning or rollback.

pub mod bootstrap;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::{SchemaEnsureError, SchemaEnsureReport, ensure_database_schema};
