//! In-memory identity directory.
//!
//! [`MemoryDirectory`] holds organizations and teams keyed by their
//! lowercased names. It is populated up front (in code or from a directory
//! file) and is read-only while a filter runs.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use super::directory_file::{DirectoryData, DirectoryFile};
use super::IdentityStore;
use crate::errors::{DirectoryFileError, StoreError};
use crate::models::{Organization, Team};

/// An organization and its teams, keyed by lowercased team name.
#[derive(Debug, Clone)]
struct OrgRecord {
    organization: Organization,
    teams: HashMap<String, Team>,
}

/// Organization/team directory kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    /// Lowercased login -> record.
    orgs: HashMap<String, OrgRecord>,
    next_id: i64,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from parsed directory-file data.
    pub fn from_data(data: &DirectoryData) -> Result<Self, StoreError> {
        let mut directory = Self::new();
        for (login, entry) in &data.orgs {
            let org = directory.add_organization(login)?;
            for name in &entry.teams {
                directory.add_team(&org, name)?;
            }
        }
        debug!(
            orgs = directory.orgs.len(),
            teams = directory.team_count(),
            "built in-memory directory"
        );
        Ok(directory)
    }

    /// Load a directory file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryFileError> {
        let path = path.as_ref();
        let data = DirectoryFile::load(path)?;
        // The file was validated, so duplicate inserts cannot happen here.
        let directory = Self::from_data(&data).map_err(|e| DirectoryFileError::InvalidEntry {
            entry: path.display().to_string(),
            detail: e.to_string(),
        })?;
        info!(path = %path.display(), "in-memory directory ready");
        Ok(directory)
    }

    /// Register an organization. Logins are unique ignoring case.
    pub fn add_organization(&mut self, login: &str) -> Result<Organization, StoreError> {
        let key = login.to_ascii_lowercase();
        if self.orgs.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: "organization".into(),
                key: login.to_string(),
            });
        }

        let organization = Organization::new(self.allocate_id(), login);
        self.orgs.insert(
            key,
            OrgRecord {
                organization: organization.clone(),
                teams: HashMap::new(),
            },
        );
        Ok(organization)
    }

    /// Register a team under an existing organization. Names are unique per
    /// organization ignoring case.
    pub fn add_team(&mut self, organization: &Organization, name: &str) -> Result<Team, StoreError> {
        let id = self.allocate_id();
        let record = self
            .orgs
            .get_mut(&organization.login.to_ascii_lowercase())
            .ok_or_else(|| StoreError::NotFound {
                entity: "organization".into(),
                key: organization.login.clone(),
            })?;

        let key = name.to_ascii_lowercase();
        if record.teams.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: "team".into(),
                key: format!("{}/{}", record.organization.login, name),
            });
        }

        let team = Team::new(id, record.organization.clone(), name);
        record.teams.insert(key, team.clone());
        Ok(team)
    }

    /// All teams, sorted by `org/team` slug.
    pub fn teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .orgs
            .values()
            .flat_map(|record| record.teams.values().cloned())
            .collect();
        teams.sort_by_key(|t| t.slug().to_ascii_lowercase());
        teams
    }

    pub fn team_count(&self) -> usize {
        self.orgs.values().map(|r| r.teams.len()).sum()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl IdentityStore for MemoryDirectory {
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self
            .orgs
            .get(&login.to_ascii_lowercase())
            .map(|record| record.organization.clone()))
    }

    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        Ok(self
            .orgs
            .get(&organization.login.to_ascii_lowercase())
            .filter(|record| record.organization.id == organization.id)
            .and_then(|record| record.teams.get(&name.to_ascii_lowercase()))
            .cloned())
    }
}
