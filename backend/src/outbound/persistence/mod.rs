//! PostgreSQL persistence adapters.
//!
//! This module provides the concrete implementation of the
//! [`SqlExecutor`](crate::domain::ports::SqlExecutor) port used by schema
//! bootstrap, backed by the blocking `postgres` client.
//!
//! # Architecture
//!
//! - **Thin adapter**: the executor only binds parameters, converts rows to
//!   text, and classifies driver errors. Ordering and idempotence live in the
//!   domain service.
//! - **Strongly typed errors**: driver errors are mapped to
//!   [`SqlExecutorError`](crate::domain::ports::SqlExecutorError) variants with
//!   the server's message, SQLSTATE, detail, and hint preserved.
//!
//! # Example
//!
//! ```ignore
//! use timetable_backend::outbound::persistence::PostgresSqlExecutor;
//!
//! let executor = PostgresSqlExecutor::connect("postgres://localhost/timetable")?;
//! ```

mod postgres_sql_executor;

pub use postgres_sql_executor::PostgresSqlExecutor;
