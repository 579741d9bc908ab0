//! Directory schema definitions and migration runner.
//!
//! Migrations are SQL strings applied in order. The SQLite `user_version`
//! pragma records the last one applied.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::StoreError;

/// All migrations, in order, as `(version, description, sql)`.
///
/// Logins and team names use `COLLATE NOCASE` so both uniqueness and lookup
/// ignore ASCII case while the stored value keeps its canonical casing.
static MIGRATIONS: &[(u32, &str, &str)] = &[
    (
        1,
        "organizations and teams",
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            login       TEXT    NOT NULL COLLATE NOCASE UNIQUE,
            created_at  TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS teams (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id      INTEGER NOT NULL REFERENCES organizations (id) ON DELETE CASCADE,
            name        TEXT    NOT NULL COLLATE NOCASE,
            created_at  TEXT    NOT NULL,
            UNIQUE (org_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_teams_org_id ON teams (org_id);
        "#,
    ),
];

/// Apply every migration newer than the database's `user_version`.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current = get_schema_version(conn)?;
    let target = MIGRATIONS.last().map(|m| m.0).unwrap_or(0);
    if current >= target {
        debug!(current, "directory schema already current");
        return Ok(());
    }
    info!(current, target, "migrating directory schema");

    for &(version, description, sql) in MIGRATIONS.iter().filter(|m| m.0 > current) {
        info!(version, description, "applying migration");
        conn.execute_batch(sql)
            .map_err(|e| StoreError::MigrationFailed {
                version,
                detail: e.to_string(),
            })?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Read the current schema version from the SQLite `user_version` pragma.
fn get_schema_version(conn: &Connection) -> Result<u32, StoreError> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Set the schema version via the SQLite `user_version` pragma.
fn set_schema_version(conn: &Connection, version: u32) -> Result<(), StoreError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}
