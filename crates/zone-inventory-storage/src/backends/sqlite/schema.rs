//! Database schema definitions and migrations for SQLite
//!
//! The table layout is shared with other tooling reading the same database
//! file, so names, columns and cascade rules must stay exactly as they are:
//!
//! - `hosts(name PK, ipv4, ipv6, disabled)`
//! - `cnames(alias PK, canonical -> hosts)`
//! - `groups(name PK)`
//! - `host_groups(host -> hosts, grp -> groups)`
//! - `group_vars(grp -> groups, key, value)`
//! - `host_vars(host -> hosts, key, value)`
//!
//! Every foreign key cascades on delete.

use sqlx::SqliteConnection;

use super::SqliteStorage;
use crate::error::StorageError;

/// Statements executed in order by [`initialize_schema`]
const SCHEMA: &[(&str, &str)] = &[
    (
        "hosts table",
        r#"
        CREATE TABLE IF NOT EXISTS hosts(
            name TEXT PRIMARY KEY,
            ipv4 TEXT,
            ipv6 TEXT,
            disabled INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "cnames table",
        r#"
        CREATE TABLE IF NOT EXISTS cnames(
            alias TEXT PRIMARY KEY,
            canonical TEXT NOT NULL,
            FOREIGN KEY(canonical) REFERENCES hosts(name) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "cnames canonical index",
        "CREATE INDEX IF NOT EXISTS idx_cnames_canonical ON cnames(canonical)",
    ),
    (
        "groups table",
        r#"
        CREATE TABLE IF NOT EXISTS groups(
            name TEXT PRIMARY KEY
        )
        "#,
    ),
    (
        "host_groups table",
        r#"
        CREATE TABLE IF NOT EXISTS host_groups(
            host TEXT NOT NULL,
            grp  TEXT NOT NULL,
            PRIMARY KEY(host, grp),
            FOREIGN KEY(host) REFERENCES hosts(name) ON DELETE CASCADE,
            FOREIGN KEY(grp)  REFERENCES groups(name) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "host_groups group index",
        "CREATE INDEX IF NOT EXISTS idx_host_groups_grp ON host_groups(grp)",
    ),
    (
        "host_groups host index",
        "CREATE INDEX IF NOT EXISTS idx_host_groups_host ON host_groups(host)",
    ),
    (
        "group_vars table",
        r#"
        CREATE TABLE IF NOT EXISTS group_vars(
            grp   TEXT NOT NULL,
            key   TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY(grp, key),
            FOREIGN KEY(grp) REFERENCES groups(name) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "host_vars table",
        r#"
        CREATE TABLE IF NOT EXISTS host_vars(
            host  TEXT NOT NULL,
            key   TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY(host, key),
            FOREIGN KEY(host) REFERENCES hosts(name) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "class_c view",
        // Hosts per /24, for planning CIDR rules
        r#"
        CREATE VIEW IF NOT EXISTS class_c AS
        SELECT
            rtrim(rtrim(ipv4, '0123456789'), '.') AS class_c_network,
            count(*) AS cnt
        FROM hosts
        WHERE ipv4 IS NOT NULL
        GROUP BY class_c_network
        ORDER BY cnt DESC
        "#,
    ),
];

/// Objects dropped by [`drop_objects`], dependents first
const DROP: &[&str] = &[
    "DROP VIEW IF EXISTS class_c",
    "DROP TABLE IF EXISTS host_vars",
    "DROP TABLE IF EXISTS group_vars",
    "DROP TABLE IF EXISTS host_groups",
    "DROP TABLE IF EXISTS groups",
    "DROP TABLE IF EXISTS cnames",
    "DROP TABLE IF EXISTS hosts",
];

/// Create all tables, indexes and views, then migrate older layouts
pub async fn initialize_schema(storage: &SqliteStorage) -> Result<(), StorageError> {
    let mut conn = storage
        .pool()
        .acquire()
        .await
        .map_err(|e| StorageError::connection("failed to acquire connection", e))?;
    create_objects(&mut conn).await
}

/// Create the schema on a given connection
pub(super) async fn create_objects(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    for (object, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::migration(format!("failed to create {object}"), e))?;
    }

    migrate_disabled_column(conn).await
}

/// Databases created before soft-delete existed lack `hosts.disabled`
async fn migrate_disabled_column(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let has_column: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM pragma_table_info('hosts') WHERE name = 'disabled')",
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StorageError::migration("failed to inspect hosts columns", e))?;

    if !has_column {
        sqlx::query("ALTER TABLE hosts ADD COLUMN disabled INTEGER NOT NULL DEFAULT 0")
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::migration("failed to add hosts.disabled column", e))?;
        tracing::info!("migrated hosts table: added disabled column");
    }

    Ok(())
}

/// Drop every inventory table and view on a given connection
pub(super) async fn drop_objects(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    for statement in DROP {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::migration(format!("wipe failed: {statement}"), e))?;
    }
    tracing::debug!("dropped inventory schema");
    Ok(())
}
