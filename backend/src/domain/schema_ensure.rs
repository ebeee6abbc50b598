//! Idempotent schema bootstrap for the timetable database.
//!
//! [`SchemaEnsurer`] walks a validated [`SchemaPlan`] and creates whatever is
//! missing: entity tables (gated by a `to_regclass` lookup), their lookup
//! indexes (`IF NOT EXISTS`, issued every run), the shared `updated_at` touch
//! function (`CREATE OR REPLACE`), and one update trigger per mutable table
//! (gated by a `pg_trigger` lookup plus a `DO` block re-check).
//!
//! Steps run strictly in order on one executor and stop at the first error.
//! Nothing is wrapped in a transaction: objects created before a failure stay
//! in place, and a later run skips them.
//!
//! A table that already exists under the expected name is never inspected
//! further, even if its shape differs from the DDL here.

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ports::{SqlExecutor, SqlExecutorError};
use crate::domain::schema_catalog::{Entity, SchemaPlan, SchemaPlanError, TriggerDescriptor};

const RELATION_LOOKUP_SQL: &str = "SELECT to_regclass($1)::text AS relation";

/// Errors returned by schema bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaEnsureError {
    /// The executor failed; surfaced unchanged.
    #[error(transparent)]
    Executor(#[from] SqlExecutorError),
    /// The static catalog failed validation before any statement ran.
    #[error("invalid schema plan: {0}")]
    Plan(#[from] SchemaPlanError),
}

/// What an ensure step found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The object was missing and has been created.
    Created,
    /// The object already existed and was left untouched.
    AlreadyPresent,
}

impl EnsureOutcome {
    /// Returns true when the step created the object.
    pub fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Result of ensuring one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOutcome {
    /// Entity whose table was ensured.
    pub entity: Entity,
    /// Whether the table was created.
    pub outcome: EnsureOutcome,
}

/// Result of ensuring one update trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// Trigger name.
    pub trigger: &'static str,
    /// Table the trigger is attached to.
    pub entity: Entity,
    /// Whether the trigger was created.
    pub outcome: EnsureOutcome,
}

/// Summary of one full bootstrap run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaEnsureReport {
    /// Per-table outcomes in creation order.
    pub tables: Vec<TableOutcome>,
    /// Per-trigger outcomes in installation order.
    pub triggers: Vec<TriggerOutcome>,
}

impl SchemaEnsureReport {
    /// Number of tables created by this run.
    pub fn created_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|table| table.outcome.is_created())
            .count()
    }

    /// Number of triggers created by this run.
    pub fn created_triggers(&self) -> usize {
        self.triggers
            .iter()
            .filter(|trigger| trigger.outcome.is_created())
            .count()
    }

    /// Returns true when every table and trigger already existed.
    pub fn is_unchanged(&self) -> bool {
        self.created_tables() == 0 && self.created_triggers() == 0
    }
}

/// Creates missing schema objects through an injected [`SqlExecutor`].
#[derive(Debug)]
pub struct SchemaEnsurer<E> {
    executor: E,
    plan: SchemaPlan,
}

impl<E: SqlExecutor> SchemaEnsurer<E> {
    /// Build an ensurer running the standard plan.
    pub fn new(executor: E) -> Result<Self, SchemaEnsureError> {
        Ok(Self::with_plan(executor, SchemaPlan::standard()?))
    }

    /// Build an ensurer running a caller-validated plan.
    pub fn with_plan(executor: E, plan: SchemaPlan) -> Self {
        Self { executor, plan }
    }

    /// Give the executor back.
    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Report whether `qualified_name` resolves to a relation.
    pub fn table_exists(&mut self, qualified_name: &str) -> Result<bool, SqlExecutorError> {
        let rows = self
            .executor
            .execute(RELATION_LOOKUP_SQL, &[qualified_name.to_owned()])?;
        Ok(rows.first().and_then(|row| row.get(0)).is_some())
    }

    /// Run `creation_sql` unless `name` already exists.
    pub fn ensure_table(
        &mut self,
        name: &str,
        creation_sql: &str,
    ) -> Result<EnsureOutcome, SqlExecutorError> {
        if self.table_exists(name)? {
            info!(table = name, "table already exists");
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        self.executor.execute(creation_sql, &[])?;
        info!(table = name, "table created");
        Ok(EnsureOutcome::Created)
    }

    /// Ensure one entity table, then issue its index statements.
    pub fn ensure_entity(&mut self, entity: Entity) -> Result<EnsureOutcome, SqlExecutorError> {
        let descriptor = entity.descriptor();
        let outcome = self.ensure_table(&descriptor.qualified_name(), descriptor.create_sql)?;
        for statement in descriptor.index_sql {
            self.executor.execute(statement, &[])?;
        }
        debug!(
            table = %entity,
            indexes = descriptor.index_sql.len(),
            "table indexes ensured"
        );
        Ok(outcome)
    }

    /// Install the touch function, then attach it to every mutable table.
    pub fn ensure_update_trigger(&mut self) -> Result<Vec<TriggerOutcome>, SqlExecutorError> {
        self.executor.execute(self.plan.touch_function_sql(), &[])?;
        debug!("updated_at touch function installed");

        let triggers = self.plan.triggers().to_vec();
        let mut outcomes = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            outcomes.push(self.ensure_trigger(&trigger)?);
        }
        Ok(outcomes)
    }

    fn ensure_trigger(
        &mut self,
        trigger: &TriggerDescriptor,
    ) -> Result<TriggerOutcome, SqlExecutorError> {
        let existing = self
            .executor
            .execute(self.plan.trigger_lookup_sql(), &trigger.lookup_params())?;

        let outcome = if existing.is_empty() {
            let statement = self.plan.trigger_create_sql(trigger);
            self.executor.execute(&statement, &[])?;
            info!(trigger = trigger.name, table = %trigger.entity, "trigger created");
            EnsureOutcome::Created
        } else {
            info!(trigger = trigger.name, table = %trigger.entity, "trigger already exists");
            EnsureOutcome::AlreadyPresent
        };

        Ok(TriggerOutcome {
            trigger: trigger.name,
            entity: trigger.entity,
            outcome,
        })
    }

    /// Ensure every table in plan order, then the update triggers.
    pub fn ensure_database_schema(&mut self) -> Result<SchemaEnsureReport, SchemaEnsureError> {
        info!(
            tables = self.plan.tables().len(),
            "ensuring database schema"
        );

        let tables = self.plan.tables().to_vec();
        let mut report = SchemaEnsureReport {
            tables: Vec::with_capacity(tables.len()),
            triggers: Vec::new(),
        };
        for descriptor in tables {
            let outcome = self.ensure_entity(descriptor.entity)?;
            report.tables.push(TableOutcome {
                entity: descriptor.entity,
                outcome,
            });
        }
        report.triggers = self.ensure_update_trigger()?;

        info!(
            created_tables = report.created_tables(),
            created_triggers = report.created_triggers(),
            "database schema ensured"
        );
        Ok(report)
    }
}

/// Run the standard bootstrap plan on `executor`.
///
/// # Examples
///
/// ```rust
/// use timetable_backend::domain::ensure_database_schema;
/// use timetable_backend::test_support::catalog::InMemoryCatalog;
///
/// let mut catalog = InMemoryCatalog::new();
/// let first = ensure_database_schema(&mut catalog).expect("first run");
/// let second = ensure_database_schema(&mut catalog).expect("second run");
///
/// assert_eq!(first.created_tables(), 6);
/// assert!(second.is_unchanged());
/// ```
pub fn ensure_database_schema<E: SqlExecutor>(
    executor: E,
) -> Result<SchemaEnsureReport, SchemaEnsureError> {
    SchemaEnsurer::new(executor)?.ensure_database_schema()
}

#[cfg(test)]
#[path = "schema_ensure_tests.rs"]
mod tests;
