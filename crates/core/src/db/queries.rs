//! Typed query helpers for the directory tables, and the
//! [`IdentityStore`] implementation built on them.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::Database;
use crate::errors::StoreError;
use crate::identity::{DirectoryData, IdentityStore};
use crate::models::{Organization, Team};

/// Counts of rows created by [`Database::import_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub orgs_added: usize,
    pub teams_added: usize,
}

const TEAM_COLUMNS: &str = "t.id, t.name, o.id, o.login
     FROM teams t JOIN organizations o ON o.id = t.org_id";

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team::new(
        row.get(0)?,
        Organization::new(row.get(2)?, row.get::<_, String>(3)?),
        row.get::<_, String>(1)?,
    ))
}

/// Translate a uniqueness violation into [`StoreError::Duplicate`].
fn map_constraint(err: rusqlite::Error, entity: &str, key: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate {
                entity: entity.to_string(),
                key: key.to_string(),
            }
        }
        other => other.into(),
    }
}

impl Database {
    // -- organizations ------------------------------------------------------

    /// Insert an organization. Fails with [`StoreError::Duplicate`] when the
    /// login already exists in any casing.
    pub fn insert_organization(&self, login: &str) -> Result<Organization, StoreError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO organizations (login, created_at) VALUES (?1, ?2)",
            params![login, now],
        )
        .map_err(|e| map_constraint(e, "organization", login))?;
        let id = conn.last_insert_rowid();
        debug!(id, login, "inserted organization");
        Ok(Organization::new(id, login))
    }

    /// Look up an organization by login, ignoring case.
    pub fn get_organization(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        let conn = self.conn();
        let org = conn
            .query_row(
                "SELECT id, login FROM organizations WHERE login = ?1",
                params![login],
                |row| Ok(Organization::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(org)
    }

    /// All organizations ordered by login.
    pub fn list_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, login FROM organizations ORDER BY login")?;
        let orgs = stmt
            .query_map([], |row| {
                Ok(Organization::new(row.get(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orgs)
    }

    // -- teams --------------------------------------------------------------

    /// Insert a team under `organization`. Fails with
    /// [`StoreError::Duplicate`] when the organization already has a team by
    /// that name in any casing.
    pub fn insert_team(&self, organization: &Organization, name: &str) -> Result<Team, StoreError> {
        let now = Utc::now().to_rfc3339();
        let slug = format!("{}/{}", organization.login, name);
        let conn = self.conn();
        conn.execute(
            "INSERT INTO teams (org_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![organization.id, name, now],
        )
        .map_err(|e| map_constraint(e, "team", &slug))?;
        let id = conn.last_insert_rowid();
        debug!(id, team = %slug, "inserted team");
        Ok(Team::new(id, organization.clone(), name))
    }

    /// Look up a team by name within an organization, ignoring case.
    pub fn get_team(&self, organization: &Organization, name: &str) -> Result<Option<Team>, StoreError> {
        let conn = self.conn();
        let sql = format!("SELECT {} WHERE t.org_id = ?1 AND t.name = ?2", TEAM_COLUMNS);
        let team = conn
            .query_row(&sql, params![organization.id, name], team_from_row)
            .optional()?;
        Ok(team)
    }

    /// All teams ordered by organization login, then team name.
    pub fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let conn = self.conn();
        let sql = format!("SELECT {} ORDER BY o.login, t.name", TEAM_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let teams = stmt
            .query_map([], team_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    // -- bulk import --------------------------------------------------------

    /// Merge a parsed directory file into the database in one transaction.
    /// Existing organizations and teams are left as they are.
    pub fn import_directory(&self, data: &DirectoryData) -> Result<ImportSummary, StoreError> {
        let summary = self.transaction(|conn| {
            let mut summary = ImportSummary::default();
            let now = Utc::now().to_rfc3339();

            for (login, entry) in &data.orgs {
                summary.orgs_added += conn.execute(
                    "INSERT OR IGNORE INTO organizations (login, created_at) VALUES (?1, ?2)",
                    params![login, now],
                )?;
                let org_id = org_id_for(conn, login)?;

                for name in &entry.teams {
                    summary.teams_added += conn.execute(
                        "INSERT OR IGNORE INTO teams (org_id, name, created_at) VALUES (?1, ?2, ?3)",
                        params![org_id, name, now],
                    )?;
                }
            }
            Ok(summary)
        })?;

        info!(
            orgs_added = summary.orgs_added,
            teams_added = summary.teams_added,
            "imported directory"
        );
        Ok(summary)
    }
}

fn org_id_for(conn: &Connection, login: &str) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT id FROM organizations WHERE login = ?1",
        params![login],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound {
        entity: "organization".into(),
        key: login.to_string(),
    })
}

impl IdentityStore for Database {
    fn find_organization_by_login(&self, login: &str) -> Result<Option<Organization>, StoreError> {
        self.get_organization(login)
    }

    fn find_team_by_name(
        &self,
        organization: &Organization,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        self.get_team(organization, name)
    }
}
