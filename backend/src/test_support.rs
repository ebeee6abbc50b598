//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is compiled for unit tests and, via the
//! `test-support` feature, for integration tests.

pub mod catalog {
    //! In-memory stand-in for the PostgreSQL catalog.
    //!
    //! [`InMemoryCatalog`] implements [`SqlExecutor`] by recognising the small
    //! set of statements the schema ensurer issues. It tracks tables, indexes,
    //! functions, and triggers, rejects foreign keys and indexes pointing at
    //! relations that do not exist yet, and honours the `DO` block gate around
    //! trigger creation. Every call is recorded so tests can assert on
    //! statement order and counts.

    use std::collections::BTreeSet;

    use crate::domain::ports::{CatalogRow, SqlExecutor, SqlExecutorError};

    /// Catalog objects visible to the double.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct CatalogSnapshot {
        /// Qualified table names.
        pub tables: BTreeSet<String>,
        /// Index names.
        pub indexes: BTreeSet<String>,
        /// Qualified function names.
        pub functions: BTreeSet<String>,
        /// `(trigger name, qualified table name)` pairs.
        pub triggers: BTreeSet<(String, String)>,
    }

    /// Statement categories understood by the double.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StatementKind {
        /// `to_regclass` existence lookup.
        RelationLookup,
        /// `pg_trigger` existence lookup.
        TriggerLookup,
        /// `CREATE TABLE IF NOT EXISTS`.
        CreateTable,
        /// `CREATE INDEX IF NOT EXISTS`.
        CreateIndex,
        /// `CREATE OR REPLACE FUNCTION`.
        CreateFunction,
        /// `DO` block wrapping a gated `CREATE TRIGGER`.
        GatedTrigger,
    }

    /// One recorded call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ExecutedStatement {
        /// Recognised category.
        pub kind: StatementKind,
        /// Statement text as received.
        pub sql: String,
        /// Bound parameters.
        pub params: Vec<String>,
    }

    /// Recording catalog double.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timetable_backend::domain::ensure_database_schema;
    /// use timetable_backend::test_support::catalog::{InMemoryCatalog, StatementKind};
    ///
    /// let mut catalog = InMemoryCatalog::new();
    /// ensure_database_schema(&mut catalog).expect("schema should be ensured");
    /// assert_eq!(catalog.count(StatementKind::CreateTable), 6);
    /// ```
    #[derive(Debug, Default)]
    pub struct InMemoryCatalog {
        state: CatalogSnapshot,
        log: Vec<ExecutedStatement>,
        trigger_creations: usize,
        failure: Option<(String, SqlExecutorError)>,
    }

    impl InMemoryCatalog {
        /// Start from an empty catalog.
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a table created out of band.
        pub fn with_table(mut self, qualified_name: impl Into<String>) -> Self {
            self.state.tables.insert(qualified_name.into());
            self
        }

        /// Fail any statement whose text contains `fragment`.
        pub fn fail_on(mut self, fragment: impl Into<String>, error: SqlExecutorError) -> Self {
            self.failure = Some((fragment.into(), error));
            self
        }

        /// Stop injecting failures.
        pub fn clear_failure(&mut self) {
            self.failure = None;
        }

        /// Copy of the current catalog objects.
        pub fn snapshot(&self) -> CatalogSnapshot {
            self.state.clone()
        }

        /// Every statement received so far, in order.
        pub fn statements(&self) -> &[ExecutedStatement] {
            &self.log
        }

        /// Number of received statements of `kind`.
        pub fn count(&self, kind: StatementKind) -> usize {
            self.log
                .iter()
                .filter(|statement| statement.kind == kind)
                .count()
        }

        /// Number of triggers actually created by gated blocks.
        pub fn trigger_creations(&self) -> usize {
            self.trigger_creations
        }

        /// Forget recorded statements, keeping catalog state.
        pub fn clear_log(&mut self) {
            self.log.clear();
            self.trigger_creations = 0;
        }

        /// Returns true when `qualified_name` exists.
        pub fn has_table(&self, qualified_name: &str) -> bool {
            self.state.tables.contains(qualified_name)
        }

        /// Returns true when `trigger` exists on `qualified_table`.
        pub fn has_trigger(&self, trigger: &str, qualified_table: &str) -> bool {
            self.state
                .triggers
                .contains(&(trigger.to_owned(), qualified_table.to_owned()))
        }

        fn require_relation(&self, relation: &str) -> Result<(), SqlExecutorError> {
            if self.state.tables.contains(relation) {
                Ok(())
            } else {
                Err(SqlExecutorError::query(format!(
                    "relation \"{relation}\" does not exist"
                )))
            }
        }

        fn create_table(&mut self, statement: &str) -> Result<(), SqlExecutorError> {
            let table = identifier_after(statement, "CREATE TABLE IF NOT EXISTS ")?;
            for target in statement.split("REFERENCES ").skip(1) {
                self.require_relation(&leading_identifier(target))?;
            }
            self.state.tables.insert(table);
            Ok(())
        }

        fn create_index(&mut self, statement: &str) -> Result<(), SqlExecutorError> {
            let index = identifier_after(statement, "CREATE INDEX IF NOT EXISTS ")?;
            let table = identifier_after(statement, " ON ")?;
            self.require_relation(&table)?;
            self.state.indexes.insert(index);
            Ok(())
        }

        fn create_trigger(&mut self, statement: &str) -> Result<(), SqlExecutorError> {
            let trigger = identifier_after(statement, "CREATE TRIGGER ")?;
            let table = identifier_after(statement, "BEFORE UPDATE ON ")?;
            let function = identifier_after(statement, "EXECUTE FUNCTION ")?;
            self.require_relation(&table)?;
            if !self.state.functions.contains(&function) {
                return Err(SqlExecutorError::query(format!(
                    "function {function}() does not exist"
                )));
            }
            if self.state.triggers.insert((trigger, table)) {
                self.trigger_creations += 1;
            }
            Ok(())
        }

        fn lookup_relation(&self, params: &[String]) -> Result<Vec<CatalogRow>, SqlExecutorError> {
            let name = param(params, 0)?;
            let resolved = self.state.tables.contains(name).then(|| name.to_owned());
            Ok(vec![CatalogRow::single(resolved)])
        }

        fn lookup_trigger(&self, params: &[String]) -> Result<Vec<CatalogRow>, SqlExecutorError> {
            let trigger = param(params, 0)?;
            let table = param(params, 1)?;
            if self.has_trigger(trigger, table) {
                Ok(vec![CatalogRow::single(Some(trigger.to_owned()))])
            } else {
                Ok(Vec::new())
            }
        }
    }

    impl SqlExecutor for InMemoryCatalog {
        fn execute(
            &mut self,
            statement: &str,
            params: &[String],
        ) -> Result<Vec<CatalogRow>, SqlExecutorError> {
            if let Some((fragment, error)) = &self.failure {
                if statement.contains(fragment.as_str()) {
                    return Err(error.clone());
                }
            }

            let kind = classify(statement).ok_or_else(|| {
                SqlExecutorError::query(format!("unsupported statement: {statement}"))
            })?;
            self.log.push(ExecutedStatement {
                kind,
                sql: statement.to_owned(),
                params: params.to_vec(),
            });

            match kind {
                StatementKind::RelationLookup => self.lookup_relation(params),
                StatementKind::TriggerLookup => self.lookup_trigger(params),
                StatementKind::CreateTable => self.create_table(statement).map(|()| Vec::new()),
                StatementKind::CreateIndex => self.create_index(statement).map(|()| Vec::new()),
                StatementKind::CreateFunction => {
                    let function = identifier_after(statement, "CREATE OR REPLACE FUNCTION ")?;
                    self.state.functions.insert(function);
                    Ok(Vec::new())
                }
                StatementKind::GatedTrigger => self.create_trigger(statement).map(|()| Vec::new()),
            }
        }
    }

    fn classify(statement: &str) -> Option<StatementKind> {
        let trimmed = statement.trim_start();
        if trimmed.starts_with("SELECT to_regclass(") {
            Some(StatementKind::RelationLookup)
        } else if trimmed.starts_with("SELECT") && trimmed.contains("FROM pg_catalog.pg_trigger") {
            Some(StatementKind::TriggerLookup)
        } else if trimmed.starts_with("CREATE TABLE IF NOT EXISTS ") {
            Some(StatementKind::CreateTable)
        } else if trimmed.starts_with("CREATE INDEX IF NOT EXISTS ") {
            Some(StatementKind::CreateIndex)
        } else if trimmed.starts_with("CREATE OR REPLACE FUNCTION ") {
            Some(StatementKind::CreateFunction)
        } else if trimmed.starts_with("DO ") && trimmed.contains("CREATE TRIGGER ") {
            Some(StatementKind::GatedTrigger)
        } else {
            None
        }
    }

    fn param(params: &[String], index: usize) -> Result<&str, SqlExecutorError> {
        params
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| SqlExecutorError::query(format!("missing parameter ${}", index + 1)))
    }

    fn leading_identifier(text: &str) -> String {
        text.trim_start()
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '.')
            .collect()
    }

    fn identifier_after(statement: &str, marker: &str) -> Result<String, SqlExecutorError> {
        statement
            .split_once(marker)
            .map(|(_, rest)| leading_identifier(rest))
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| {
                SqlExecutorError::query(format!("expected identifier after `{}`", marker.trim()))
            })
    }

}
