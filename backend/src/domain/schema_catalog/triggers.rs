//! Shared `updated_at` touch function and the per-table triggers using it.

use super::{Entity, SCHEMA_NAME, TriggerDescriptor};

/// Name of the shared trigger function, unqualified.
pub const TOUCH_FUNCTION_NAME: &str = "update_updated_at_column";

/// `CREATE OR REPLACE` keeps this statement safe to issue on every run.
/// `NOW()` is the transaction start time.
pub(super) const TOUCH_FUNCTION_SQL: &str = concat!(
    "CREATE OR REPLACE FUNCTION public.update_updated_at_column() ",
    "RETURNS TRIGGER AS $$\n",
    "BEGIN\n",
    "    NEW.updated_at = NOW();\n",
    "    RETURN NEW;\n",
    "END;\n",
    "$$ LANGUAGE plpgsql"
);

/// Every table with an `updated_at` column, in creation order.
pub(super) const UPDATE_TRIGGERS: &[TriggerDescriptor] = &[
    TriggerDescriptor {
        name: "update_users_updated_at",
        entity: Entity::Users,
    },
    TriggerDescriptor {
        name: "update_groups_updated_at",
        entity: Entity::Groups,
    },
    TriggerDescriptor {
        name: "update_subjects_updated_at",
        entity: Entity::Subjects,
    },
    TriggerDescriptor {
        name: "update_schedule_updated_at",
        entity: Entity::Schedule,
    },
    TriggerDescriptor {
        name: "update_attendance_updated_at",
        entity: Entity::Attendance,
    },
];

pub(super) const TRIGGER_LOOKUP_SQL: &str = concat!(
    "SELECT tg.tgname::text AS trigger_name ",
    "FROM pg_catalog.pg_trigger tg ",
    "WHERE tg.tgname = $1 ",
    "  AND tg.tgrelid = to_regclass($2) ",
    "  AND NOT tg.tgisinternal"
);

/// Render the gated creation block for one trigger.
///
/// Trigger creation has no `IF NOT EXISTS`, so the catalog check and the
/// `CREATE TRIGGER` run inside one `DO` block. Identifiers are interpolated;
/// callers must only pass descriptors that passed plan validation.
pub(super) fn render_gated_create(trigger: &TriggerDescriptor) -> String {
    let name = trigger.name;
    let table = trigger.entity.table_name();
    format!(
        concat!(
            "DO $$\n",
            "BEGIN\n",
            "    IF NOT EXISTS (\n",
            "        SELECT 1 FROM pg_catalog.pg_trigger\n",
            "        WHERE tgname = '{name}'\n",
            "          AND tgrelid = '{schema}.{table}'::regclass\n",
            "    ) THEN\n",
            "        CREATE TRIGGER {name}\n",
            "            BEFORE UPDATE ON {schema}.{table}\n",
            "            FOR EACH ROW EXECUTE FUNCTION {schema}.{function}();\n",
            "    END IF;\n",
            "END\n",
            "$$"
        ),
        name = name,
        schema = SCHEMA_NAME,
        table = table,
        function = TOUCH_FUNCTION_NAME,
    )
}
