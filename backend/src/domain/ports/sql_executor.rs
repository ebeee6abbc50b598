//! Port abstraction for the statement executor used by schema bootstrap.
//!
//! The executor is the only capability the schema ensurer needs from the
//! persistence layer: run one statement with positional text parameters and
//! hand back the resulting rows. Keeping it behind a trait lets the domain
//! service run against the in-memory catalog double in tests and against
//! PostgreSQL in production.

use super::define_port_error;

define_port_error! {
    /// Errors raised while executing catalog lookups or DDL statements.
    pub enum SqlExecutorError {
        /// The connection could not be opened or was lost mid-statement.
        Connection { message: String } =>
            "schema executor connection failed: {message}",
        /// The statement was rejected by an integrity constraint.
        ConstraintViolation { message: String } =>
            "schema statement violated a constraint: {message}",
        /// Any other statement failure reported by the database.
        Query { message: String } =>
            "schema statement failed: {message}",
    }
}

/// A single result row with every column rendered as optional text.
///
/// Catalog lookups issued by the schema ensurer cast their output to `text`,
/// so a flat list of nullable strings is enough to carry them across the port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    values: Vec<Option<String>>,
}

impl CatalogRow {
    /// Build a row from its column values in select-list order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timetable_backend::domain::ports::CatalogRow;
    ///
    /// let row = CatalogRow::new(vec![Some("users".to_owned()), None]);
    /// assert_eq!(row.get(0), Some("users"));
    /// assert_eq!(row.get(1), None);
    /// ```
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Build a one-column row.
    pub fn single(value: Option<String>) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// Return the text value at `index`, or `None` for SQL `NULL` and
    /// out-of-range indices alike.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Option::as_deref)
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the row carries no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Port for executing statements against the schema's backing database.
///
/// Implementations run each call to completion before returning; the schema
/// ensurer never issues overlapping calls on one executor.
#[cfg_attr(test, mockall::automock)]
pub trait SqlExecutor {
    /// Execute `statement` with positional `params` bound as text and return
    /// the produced rows (empty for DDL).
    fn execute(
        &mut self,
        statement: &str,
        params: &[String],
    ) -> Result<Vec<CatalogRow>, SqlExecutorError>;
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for &mut E {
    fn execute(
        &mut self,
        statement: &str,
        params: &[String],
    ) -> Result<Vec<CatalogRow>, SqlExecutorError> {
        (**self).execute(statement, params)
    }
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for Box<E> {
    fn execute(
        &mut self,
        statement: &str,
        params: &[String],
    ) -> Result<Vec<CatalogRow>, SqlExecutorError> {
        (**self).execute(statement, params)
    }
}
