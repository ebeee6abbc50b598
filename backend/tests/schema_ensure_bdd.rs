//! Behavioural tests for idempotent schema bootstrap against embedded
//! PostgreSQL.

use std::time::Duration;

use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use timetable_backend::bootstrap::{SchemaBootstrapSettings, ensure_schema_on_startup};
use timetable_backend::domain::schema_catalog::Entity;
use timetable_backend::domain::{EnsureOutcome, SchemaEnsureReport, ensure_database_schema};
use timetable_backend::outbound::persistence::PostgresSqlExecutor;

mod support;

use support::embedded_postgres::{
    CatalogState, catalog_state, column_names, connect, empty_database, run_sql,
};
use support::{format_postgres_error, handle_cluster_setup_failure};

const OUT_OF_BAND_SUBJECTS: &str = "CREATE TABLE public.subjects (\
     id SERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     type TEXT NOT NULL)";

#[derive(Debug)]
struct SchemaEnsureWorld {
    database: Option<TemporaryDatabase>,
    reports: Vec<SchemaEnsureReport>,
    catalogs: Vec<CatalogState>,
    setup_error: Option<String>,
}

impl SchemaEnsureWorld {
    fn ready(database: TemporaryDatabase) -> Self {
        Self {
            database: Some(database),
            reports: Vec::new(),
            catalogs: Vec::new(),
            setup_error: None,
        }
    }

    fn skipped(reason: String) -> Self {
        Self {
            database: None,
            reports: Vec::new(),
            catalogs: Vec::new(),
            setup_error: Some(reason),
        }
    }

    fn is_skipped(&self) -> bool {
        self.setup_error.is_some()
    }

    fn database_url(&self) -> &str {
        self.database
            .as_ref()
            .expect("database should be available")
            .url()
    }

    fn ensure_schema(&mut self) {
        let mut executor =
            PostgresSqlExecutor::connect(self.database_url()).expect("executor should connect");
        let report = ensure_database_schema(&mut executor).expect("schema should be ensured");
        self.record(report);
    }

    fn record(&mut self, report: SchemaEnsureReport) {
        let catalog = catalog_state(self.database_url()).expect("catalog should be readable");
        self.reports.push(report);
        self.catalogs.push(catalog);
    }

    fn last_report(&self) -> &SchemaEnsureReport {
        self.reports.last().expect("schema should have been ensured")
    }

    fn last_catalog(&self) -> &CatalogState {
        self.catalogs.last().expect("catalog should have been captured")
    }
}

fn skip_if_needed(world: &SchemaEnsureWorld) -> bool {
    if world.is_skipped() {
        let reason = world.setup_error.as_deref().unwrap_or("unknown reason");
        eprintln!("SKIP-TEST-CLUSTER: scenario skipped ({reason})");
        true
    } else {
        false
    }
}

#[fixture]
fn world() -> SchemaEnsureWorld {
    match empty_database() {
        Ok(database) => SchemaEnsureWorld::ready(database),
        Err(reason) => {
            let _: Option<()> = handle_cluster_setup_failure(reason.clone());
            SchemaEnsureWorld::skipped(reason)
        }
    }
}

#[given("an empty database")]
fn an_empty_database(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let catalog = catalog_state(world.database_url()).expect("catalog should be readable");
    assert!(catalog.tables.is_empty(), "fresh database should have no tables");
}

#[given("a subjects table created out of band")]
fn a_subjects_table_created_out_of_band(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    run_sql(world.database_url(), OUT_OF_BAND_SUBJECTS).expect("subjects table should be created");
}

#[when("the database schema is ensured")]
fn the_database_schema_is_ensured(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    world.ensure_schema();
}

#[when("the database schema is ensured again")]
fn the_database_schema_is_ensured_again(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    world.ensure_schema();
}

#[when("the schema is ensured from startup settings")]
fn the_schema_is_ensured_from_startup_settings(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let settings = SchemaBootstrapSettings::for_url(world.database_url());
    let report = ensure_schema_on_startup(&settings).expect("startup bootstrap should succeed");
    world.record(report);
}

#[when("a user row is inserted and later renamed")]
fn a_user_row_is_inserted_and_later_renamed(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let mut client = connect(world.database_url()).expect("client should connect");
    client
        .execute(
            "INSERT INTO users (full_name, role) VALUES ('Olena Koval', 'teacher')",
            &[],
        )
        .map_err(|error| format_postgres_error(&error))
        .expect("user should insert");
    std::thread::sleep(Duration::from_millis(20));
    client
        .execute(
            "UPDATE users SET full_name = 'Olena Kovalenko' WHERE full_name = 'Olena Koval'",
            &[],
        )
        .map_err(|error| format_postgres_error(&error))
        .expect("user should update");
}

#[then("all six entity tables exist")]
fn all_six_entity_tables_exist(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let mut expected: Vec<String> = Entity::ALL
        .iter()
        .map(|entity| entity.table_name().to_owned())
        .collect();
    expected.sort();
    assert_eq!(world.last_catalog().tables, expected);
}

#[then("{count} lookup indexes exist")]
fn lookup_indexes_exist(world: &mut SchemaEnsureWorld, count: usize) {
    if skip_if_needed(world) {
        return;
    }
    let indexes = &world.last_catalog().indexes;
    assert_eq!(indexes.len(), count, "unexpected indexes: {indexes:?}");
    assert!(indexes.iter().any(|name| name == "idx_schedule_day_week"));
}

#[then("update triggers exist on the five mutable tables")]
fn update_triggers_exist_on_the_five_mutable_tables(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let triggers = &world.last_catalog().triggers;
    let mutable: Vec<&Entity> = Entity::ALL
        .iter()
        .filter(|entity| entity.has_updated_at())
        .collect();
    assert_eq!(triggers.len(), mutable.len());
    for entity in mutable {
        let trigger = format!("update_{}_updated_at", entity.table_name());
        assert!(
            triggers
                .iter()
                .any(|(name, table)| *name == trigger && table == entity.table_name()),
            "missing trigger {trigger}"
        );
    }
    assert!(
        triggers.iter().all(|(_, table)| table != "group_students"),
        "group_students must not carry an update trigger"
    );
}

#[then("the report lists {tables} created tables and {triggers} created triggers")]
fn the_report_lists_created_objects(
    world: &mut SchemaEnsureWorld,
    tables: usize,
    triggers: usize,
) {
    if skip_if_needed(world) {
        return;
    }
    let report = world.last_report();
    assert_eq!(report.created_tables(), tables);
    assert_eq!(report.created_triggers(), triggers);
}

#[then("the second run reports no changes")]
fn the_second_run_reports_no_changes(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    assert_eq!(world.reports.len(), 2);
    assert!(world.last_report().is_unchanged());
}

#[then("the catalog matches the first run")]
fn the_catalog_matches_the_first_run(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let [first, second] = world.catalogs.as_slice() else {
        panic!("expected two catalog snapshots, got {}", world.catalogs.len());
    };
    assert_eq!(first, second);
}

#[then("the subjects table is reported as already present")]
fn the_subjects_table_is_reported_as_already_present(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let report = world.last_report();
    let subjects = report
        .tables
        .iter()
        .find(|table| table.entity == Entity::Subjects)
        .expect("subjects outcome should be reported");
    assert_eq!(subjects.outcome, EnsureOutcome::AlreadyPresent);
    assert_eq!(report.created_tables(), 5);
}

#[then("the out-of-band subjects table keeps its columns")]
fn the_out_of_band_subjects_table_keeps_its_columns(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let columns = column_names(world.database_url(), "subjects").expect("columns should load");
    assert_eq!(columns, ["id", "name", "type"]);
}

#[then("the user's updated_at is later than its created_at")]
fn the_users_updated_at_is_later_than_its_created_at(world: &mut SchemaEnsureWorld) {
    if skip_if_needed(world) {
        return;
    }
    let mut client = connect(world.database_url()).expect("client should connect");
    let row = client
        .query_one(
            "SELECT updated_at > created_at FROM users WHERE full_name = 'Olena Kovalenko'",
            &[],
        )
        .map_err(|error| format_postgres_error(&error))
        .expect("renamed user should exist");
    let refreshed: bool = row.get(0);
    assert!(refreshed, "update trigger should refresh updated_at");
}

#[scenario(
    path = "tests/features/schema_ensure.feature",
    name = "Fresh database receives the full schema"
)]
fn fresh_database_receives_the_full_schema(world: SchemaEnsureWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/schema_ensure.feature",
    name = "Second run leaves the catalog unchanged"
)]
fn second_run_leaves_the_catalog_unchanged(world: SchemaEnsureWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/schema_ensure.feature",
    name = "Table created out of band is left untouched"
)]
fn table_created_out_of_band_is_left_untouched(world: SchemaEnsureWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/schema_ensure.feature",
    name = "Updating a row refreshes updated_at"
)]
fn updating_a_row_refreshes_updated_at(world: SchemaEnsureWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/schema_ensure.feature",
    name = "Bootstrap through startup settings"
)]
fn bootstrap_through_startup_settings(world: SchemaEnsureWorld) {
    drop(world);
}
