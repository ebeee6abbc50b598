//! Static catalog of the tables, indexes, and triggers schema bootstrap owns.
//!
//! Everything here is immutable and defined at compile time. The only
//! identifiers ever interpolated into SQL come from this module, and
//! [`SchemaPlan`] validates them against a strict identifier pattern before
//! any statement is issued.
//!
//! Entities are listed in foreign-key dependency order: a table appears only
//! after every table it references.

mod tables;
mod triggers;

use thiserror::Error;

pub use triggers::TOUCH_FUNCTION_NAME;

/// Schema that owns every bootstrap-managed object.
pub const SCHEMA_NAME: &str = "public";

/// One domain noun backed by an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// Identities with a role and optional telegram or credential linkage.
    Users,
    /// Study groups, optionally curated by a user.
    Groups,
    /// Teachable units.
    Subjects,
    /// Recurring lessons binding a subject, a group, and a teacher.
    Schedule,
    /// Group membership join table.
    GroupStudents,
    /// Per-lesson, per-date attendance marks.
    Attendance,
}

impl Entity {
    /// All entities in creation order.
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::Groups,
        Self::Subjects,
        Self::Schedule,
        Self::GroupStudents,
        Self::Attendance,
    ];

    /// Unqualified table name.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Subjects => "subjects",
            Self::Schedule => "schedule",
            Self::GroupStudents => "group_students",
            Self::Attendance => "attendance",
        }
    }

    /// Schema-qualified table name, as passed to the existence checker.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timetable_backend::domain::schema_catalog::Entity;
    ///
    /// assert_eq!(Entity::GroupStudents.qualified_name(), "public.group_students");
    /// ```
    pub fn qualified_name(self) -> String {
        format!("{SCHEMA_NAME}.{}", self.table_name())
    }

    /// Tables this entity's foreign keys point at.
    pub const fn references(self) -> &'static [Self] {
        match self {
            Self::Users | Self::Subjects => &[],
            Self::Groups => &[Self::Users],
            Self::Schedule => &[Self::Subjects, Self::Groups, Self::Users],
            Self::GroupStudents => &[Self::Groups, Self::Users],
            Self::Attendance => &[Self::Schedule, Self::Users],
        }
    }

    /// Whether the table carries an `updated_at` column.
    pub const fn has_updated_at(self) -> bool {
        !matches!(self, Self::GroupStudents)
    }

    /// Static descriptor holding the entity's DDL.
    pub const fn descriptor(self) -> &'static TableDescriptor {
        match self {
            Self::Users => &tables::USERS,
            Self::Groups => &tables::GROUPS,
            Self::Subjects => &tables::SUBJECTS,
            Self::Schedule => &tables::SCHEDULE,
            Self::GroupStudents => &tables::GROUP_STUDENTS,
            Self::Attendance => &tables::ATTENDANCE,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Creation DDL and lookup indexes for one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Entity the table backs.
    pub entity: Entity,
    /// Full `CREATE TABLE IF NOT EXISTS` statement with inline constraints.
    pub create_sql: &'static str,
    /// `CREATE INDEX IF NOT EXISTS` statements, issued on every run.
    pub index_sql: &'static [&'static str],
}

impl TableDescriptor {
    /// Schema-qualified name of the described table.
    pub fn qualified_name(&self) -> String {
        self.entity.qualified_name()
    }
}

/// A `BEFORE UPDATE` trigger attaching the touch function to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerDescriptor {
    /// Trigger name; unique per table in `pg_trigger`.
    pub name: &'static str,
    /// Table the trigger is attached to.
    pub entity: Entity,
}

impl TriggerDescriptor {
    /// Positional parameters for the trigger lookup query.
    pub fn lookup_params(&self) -> [String; 2] {
        [self.name.to_owned(), self.entity.qualified_name()]
    }
}

/// Faults in the static catalog detected before any statement runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaPlanError {
    /// An identifier falls outside `[a-z_][a-z0-9_]*`.
    #[error("identifier is not allowed in schema DDL: {identifier:?}")]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
    },
    /// A table is scheduled before a table it references.
    #[error("table {table} is ensured before its dependency {dependency}")]
    DependencyOutOfOrder {
        /// Table whose foreign key would dangle.
        table: Entity,
        /// Referenced table that has not been ensured yet.
        dependency: Entity,
    },
    /// A table appears twice in the plan.
    #[error("table {table} appears more than once in the schema plan")]
    DuplicateTable {
        /// The repeated table.
        table: Entity,
    },
    /// A trigger targets a table that is missing from the plan or has no
    /// `updated_at` column.
    #[error("trigger {trigger} cannot be attached to table {table}")]
    TriggerTarget {
        /// Trigger name.
        trigger: String,
        /// Target table.
        table: Entity,
    },
}

/// Accept only lowercase SQL identifiers safe to splice into DDL unquoted.
///
/// # Examples
///
/// ```rust
/// use timetable_backend::domain::schema_catalog::validate_identifier;
///
/// assert!(validate_identifier("update_users_updated_at").is_ok());
/// assert!(validate_identifier("users; DROP TABLE users").is_err());
/// ```
pub fn validate_identifier(identifier: &str) -> Result<&str, SchemaPlanError> {
    let mut chars = identifier.chars();
    let starts_well = chars
        .next()
        .is_some_and(|first| matches!(first, 'a'..='z' | '_'));
    let rest_ok = chars.all(|ch| matches!(ch, 'a'..='z' | '0'..='9' | '_'));

    if starts_well && rest_ok && identifier.len() <= 63 {
        Ok(identifier)
    } else {
        Err(SchemaPlanError::InvalidIdentifier {
            identifier: identifier.to_owned(),
        })
    }
}

/// Validated, ordered list of ensure steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    tables: Vec<&'static TableDescriptor>,
    triggers: Vec<TriggerDescriptor>,
}

impl SchemaPlan {
    /// The production plan: all six entities, then the five update triggers.
    pub fn standard() -> Result<Self, SchemaPlanError> {
        Self::new(&Entity::ALL, triggers::UPDATE_TRIGGERS)
    }

    /// Validate a custom ordering of entities and triggers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timetable_backend::domain::schema_catalog::{Entity, SchemaPlan, SchemaPlanError};
    ///
    /// let err = SchemaPlan::new(&[Entity::Groups, Entity::Users], &[]).unwrap_err();
    /// assert_eq!(
    ///     err,
    ///     SchemaPlanError::DependencyOutOfOrder {
    ///         table: Entity::Groups,
    ///         dependency: Entity::Users,
    ///     }
    /// );
    /// ```
    pub fn new(
        entities: &[Entity],
        triggers: &[TriggerDescriptor],
    ) -> Result<Self, SchemaPlanError> {
        validate_identifier(SCHEMA_NAME)?;
        validate_identifier(TOUCH_FUNCTION_NAME)?;

        let mut ensured: Vec<Entity> = Vec::with_capacity(entities.len());
        for &entity in entities {
            validate_identifier(entity.table_name())?;
            if ensured.contains(&entity) {
                return Err(SchemaPlanError::DuplicateTable { table: entity });
            }
            if let Some(&dependency) = entity
                .references()
                .iter()
                .find(|dependency| !ensured.contains(dependency))
            {
                return Err(SchemaPlanError::DependencyOutOfOrder {
                    table: entity,
                    dependency,
                });
            }
            ensured.push(entity);
        }

        for trigger in triggers {
            validate_identifier(trigger.name)?;
            if !trigger.entity.has_updated_at() || !ensured.contains(&trigger.entity) {
                return Err(SchemaPlanError::TriggerTarget {
                    trigger: trigger.name.to_owned(),
                    table: trigger.entity,
                });
            }
        }

        Ok(Self {
            tables: entities.iter().map(|entity| entity.descriptor()).collect(),
            triggers: triggers.to_vec(),
        })
    }

    /// Table descriptors in execution order.
    pub fn tables(&self) -> &[&'static TableDescriptor] {
        &self.tables
    }

    /// Trigger descriptors in execution order.
    pub fn triggers(&self) -> &[TriggerDescriptor] {
        &self.triggers
    }

    /// Statement installing the shared touch function.
    pub fn touch_function_sql(&self) -> &'static str {
        triggers::TOUCH_FUNCTION_SQL
    }

    /// Catalog query returning one row when `trigger` already exists.
    pub fn trigger_lookup_sql(&self) -> &'static str {
        triggers::TRIGGER_LOOKUP_SQL
    }

    /// Gated `DO` block creating `trigger` only if it is still absent.
    pub fn trigger_create_sql(&self, trigger: &TriggerDescriptor) -> String {
        triggers::render_gated_create(trigger)
    }
}
