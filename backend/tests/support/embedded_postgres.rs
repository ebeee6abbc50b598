//! Embedded PostgreSQL provisioning and catalog snapshots.
//!
//! Every scenario gets its own empty temporary database on one shared
//! cluster, so schema bootstrap always starts from a blank catalog.

use std::time::Duration;

use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

const SHARED_CLUSTER_RETRIES: usize = 5;
const SHARED_CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Returns the process-wide cluster, retrying transient start-up failures.
pub fn shared_cluster_handle() -> BootstrapResult<&'static ClusterHandle> {
    ensure_stable_password();
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) => {
                if attempt >= SHARED_CLUSTER_RETRIES {
                    return Err(error);
                }
                std::thread::sleep(SHARED_CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

/// Keeps `PG_PASSWORD` stable across processes that reuse one data directory.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: called before the library spawns any threads; the shared
        // cluster singleton serializes access, so this runs once per process.
        unsafe {
            std::env::set_var("PG_PASSWORD", "timetable_embedded_test");
        }
    }
}

fn new_test_database_name() -> String {
    format!("test_{}", Uuid::new_v4().simple())
}

/// Create an empty, uniquely named temporary database on the shared cluster.
pub fn empty_database() -> Result<TemporaryDatabase, String> {
    let cluster = shared_cluster_handle().map_err(|error| error.to_string())?;
    let db_name = new_test_database_name();
    cluster
        .temporary_database(db_name.as_str())
        .map_err(|error| format!("create temporary database {db_name}: {error:?}"))
}

/// Open a plain client for fixture setup and catalog assertions.
pub fn connect(url: &str) -> Result<Client, String> {
    Client::connect(url, NoTls).map_err(|error| format_postgres_error(&error))
}

/// Run a batch of statements outside the code under test.
pub fn run_sql(url: &str, sql: &str) -> Result<(), String> {
    let mut client = connect(url)?;
    client
        .batch_execute(sql)
        .map_err(|error| format_postgres_error(&error))
}

/// Snapshot of the bootstrap-managed catalog objects in `public`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogState {
    pub tables: Vec<String>,
    pub indexes: Vec<String>,
    pub triggers: Vec<(String, String)>,
}

/// Read tables, `idx_` indexes, and user triggers from the live catalog.
pub fn catalog_state(url: &str) -> Result<CatalogState, String> {
    let mut client = connect(url)?;
    let tables = text_column(
        &mut client,
        "SELECT tablename::text FROM pg_catalog.pg_tables \
         WHERE schemaname = 'public' ORDER BY tablename",
    )?;
    let indexes = text_column(
        &mut client,
        "SELECT indexname::text FROM pg_catalog.pg_indexes \
         WHERE schemaname = 'public' AND indexname LIKE 'idx\\_%' ORDER BY indexname",
    )?;
    let triggers: Vec<(String, String)> = client
        .query(
            "SELECT tg.tgname::text, cls.relname::text \
             FROM pg_catalog.pg_trigger tg \
             JOIN pg_catalog.pg_class cls ON cls.oid = tg.tgrelid \
             WHERE NOT tg.tgisinternal ORDER BY tg.tgname",
            &[],
        )
        .map_err(|error| format_postgres_error(&error))?
        .iter()
        .map(|row| (row.get(0), row.get(1)))
        .collect();

    Ok(CatalogState {
        tables,
        indexes,
        triggers,
    })
}

/// Column names of `public.<table>` in ordinal order.
pub fn column_names(url: &str, table: &str) -> Result<Vec<String>, String> {
    let mut client = connect(url)?;
    client
        .query(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
            &[&table],
        )
        .map(|rows| rows.iter().map(|row| row.get(0)).collect())
        .map_err(|error| format_postgres_error(&error))
}

fn text_column(client: &mut Client, sql: &str) -> Result<Vec<String>, String> {
    client
        .query(sql, &[])
        .map(|rows| rows.iter().map(|row| row.get(0)).collect())
        .map_err(|error| format_postgres_error(&error))
}
