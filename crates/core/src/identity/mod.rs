//! Identity store capability used to resolve mentions.
//!
//! The mention filter never talks to a data layer directly. It is handed an
//! [`IdentityStore`] and asks two questions of it: does this organization
//! exist, and does it have a team by this name. Both lookups are
//! case-insensitive exact matches; "not found" is `Ok(None)`, and `Err` is
//! reserved for a store that could not answer.
//!
//! Implementations:
//! 1. [`MemoryDirectory`], built in code or from a TOML directory file
//! 2. [`crate::db::Database`], a SQLite-backed directory

pub mod directory_file;
pub mod memory;

use std::sync::Arc;

use tracing::warn;

use crate::config::DirectoryConfig;
use crate::db::Database;
use crate::errors::{CoreError, StoreError};
use crate::models::{Organization, Team};

pub use directory_file::{DirectoryData, DirectoryFile, OrgEntry};
pub use memory::MemoryDirectory;

/// Lookup capability over organizations and their teams.
pub trait IdentityStore: Send + Sync {
    /// Find an organization by login, ignoring ASCII case.
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError>;

    /// Find a team by name within `organization`, ignoring ASCII case.
    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError>;
}

impl<S: IdentityStore + ?Sized> IdentityStore for &S {
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        (**self).find_organization_by_login(login)
    }

    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        (**self).find_team_by_name(organization, name)
    }
}

impl<S: IdentityStore + ?Sized> IdentityStore for Arc<S> {
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        (**self).find_organization_by_login(login)
    }

    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        (**self).find_team_by_name(organization, name)
    }
}

impl<S: IdentityStore + ?Sized> IdentityStore for Box<S> {
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        (**self).find_organization_by_login(login)
    }

    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        (**self).find_team_by_name(organization, name)
    }
}

/// Open the store selected by `[directory]`. With neither source set the
/// directory is empty and every mention passes through.
pub fn open_store(config: &DirectoryConfig) -> Result<Box<dyn IdentityStore>, CoreError> {
    if let Some(path) = &config.database {
        return Ok(Box::new(Database::open(path)?));
    }
    match &config.file {
        Some(path) => Ok(Box::new(MemoryDirectory::load(path)?)),
        None => {
            warn!("no directory configured; no mention will resolve");
            Ok(Box::new(MemoryDirectory::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_from_directory_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.toml");
        std::fs::write(&path, "[orgs.acme]\nteams = [\"ops\"]\n").unwrap();

        let config = DirectoryConfig {
            file: Some(path),
            database: None,
        };
        let store = open_store(&config).unwrap();
        let org = store.find_organization_by_login("acme").unwrap().unwrap();
        assert!(store.find_team_by_name(&org, "ops").unwrap().is_some());
    }

    #[test]
    fn test_open_store_from_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.db");
        let db = Database::open(&path).unwrap();
        let acme = db.insert_organization("acme").unwrap();
        db.insert_team(&acme, "ops").unwrap();
        drop(db);

        let config = DirectoryConfig {
            file: None,
            database: Some(path),
        };
        let store = open_store(&config).unwrap();
        let org = store.find_organization_by_login("ACME").unwrap().unwrap();
        assert!(store.find_team_by_name(&org, "OPS").unwrap().is_some());
    }

    #[test]
    fn test_open_store_missing_file_is_core_error() {
        let config = DirectoryConfig {
            file: Some("/nonexistent/directory.toml".into()),
            database: None,
        };
        assert!(matches!(open_store(&config), Err(CoreError::DirectoryFile(_))));
    }

    #[test]
    fn test_open_store_without_source_is_empty() {
        let store = open_store(&DirectoryConfig::default()).unwrap();
        assert!(store.find_organization_by_login("acme").unwrap().is_none());
    }
}
