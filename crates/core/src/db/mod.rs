//! SQLite-backed organization/team directory.
//!
//! Provides a [`Database`] handle with WAL-mode journaling, automatic schema
//! migrations, and query helpers for the `organizations` and `teams` tables.
//! [`Database`] implements [`crate::identity::IdentityStore`] so it can back
//! the mention filter directly.

pub mod queries;
pub mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::StoreError;

/// Connection pragmas applied to every file-backed directory.
const FILE_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
";

/// Handle to a SQLite organization/team directory.
///
/// The connection is wrapped in a `Mutex` so that `Database` is
/// `Send + Sync`, as [`crate::identity::IdentityStore`] requires.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite directory at `path` without migrating it.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening directory database");

        let conn = Connection::open(path)?;
        conn.execute_batch(FILE_PRAGMAS)?;

        debug!("directory database opened with WAL mode");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open `path` and bring its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Self::new(path)?;
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run all schema migrations to bring the database up to date.
    pub fn initialize(&self) -> Result<(), StoreError> {
        info!("initializing directory schema");
        schema::run_migrations(&self.conn())?;
        debug!("directory schema is up to date");
        Ok(())
    }

    /// Lock the underlying connection. A poisoned lock is recovered.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("directory connection mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Execute a closure inside a SQLite transaction. If the closure returns
    /// `Ok`, the transaction is committed; otherwise it is rolled back.
    pub fn transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().expect("failed to create in-memory db");
        db.initialize().expect("failed to initialize schema");
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.db");
        let db = Database::open(&path).expect("failed to open file db");
        db.insert_organization("acme").unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.list_organizations().unwrap().len(), 1);
    }

    #[test]
    fn test_transaction_commit() {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();

        db.transaction(|conn| {
            conn.execute(
                "INSERT INTO organizations (login, created_at) VALUES (?1, ?2)",
                rusqlite::params!["acme", "2025-01-01T00:00:00Z"],
            )?;
            Ok(())
        })
        .unwrap();

        let login: String = db
            .conn()
            .query_row(
                "SELECT login FROM organizations WHERE login = ?1",
                rusqlite::params!["ACME"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(login, "acme");
    }

    #[test]
    fn test_transaction_rollback() {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();

        let result: Result<(), StoreError> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO organizations (login, created_at) VALUES (?1, ?2)",
                rusqlite::params!["rollback_test", "2025-01-01T00:00:00Z"],
            )?;
            Err(StoreError::NotFound {
                entity: "test".into(),
                key: "forced".into(),
            })
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM organizations WHERE login = ?1",
                rusqlite::params!["rollback_test"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
