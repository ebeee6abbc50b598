//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod sql_executor;

#[cfg(test)]
pub use sql_executor::MockSqlExecutor;
pub use sql_executor::{CatalogRow, SqlExecutor, SqlExecutorError};
