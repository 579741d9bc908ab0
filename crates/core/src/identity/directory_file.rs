//! TOML-based organization/team directory file reader/writer.
//!
//! The directory file format:
//!
//! ```toml
//! [orgs.acme]
//! teams = ["frontend", "Platform-Core"]
//!
//! [orgs.globex]
//! teams = ["ops"]
//! ```
//!
//! Table keys are organization logins. Casing is kept as written and becomes
//! the canonical casing used when a mention is rendered.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::DirectoryFileError;

/// A single organization entry in the directory file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgEntry {
    /// Team names belonging to the organization.
    #[serde(default)]
    pub teams: Vec<String>,
}

/// Wrapper around the TOML directory file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryData {
    /// The `[orgs]` table mapping login -> OrgEntry.
    #[serde(default)]
    pub orgs: BTreeMap<String, OrgEntry>,
}

impl DirectoryData {
    /// Reject logins or team names that collide case-insensitively, and
    /// empty names.
    pub fn validate(&self) -> Result<(), DirectoryFileError> {
        let mut logins = HashSet::new();
        for (login, entry) in &self.orgs {
            if login.trim().is_empty() {
                return Err(DirectoryFileError::InvalidEntry {
                    entry: login.clone(),
                    detail: "organization login must not be empty".into(),
                });
            }
            if !logins.insert(login.to_ascii_lowercase()) {
                return Err(DirectoryFileError::InvalidEntry {
                    entry: login.clone(),
                    detail: "organization login differs from another only by case".into(),
                });
            }

            let mut names = HashSet::new();
            for team in &entry.teams {
                if team.trim().is_empty() {
                    return Err(DirectoryFileError::InvalidEntry {
                        entry: login.clone(),
                        detail: "team name must not be empty".into(),
                    });
                }
                if !names.insert(team.to_ascii_lowercase()) {
                    return Err(DirectoryFileError::InvalidEntry {
                        entry: format!("{}/{}", login, team),
                        detail: "duplicate team name".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Total number of teams across all organizations.
    pub fn team_count(&self) -> usize {
        self.orgs.values().map(|o| o.teams.len()).sum()
    }
}

/// Utilities for loading and saving the directory file.
pub struct DirectoryFile;

impl DirectoryFile {
    /// Load and validate the directory file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DirectoryData, DirectoryFileError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading directory file");

        if !path.exists() {
            return Err(DirectoryFileError::FileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let data = Self::parse(&contents)?;

        debug!(
            orgs = data.orgs.len(),
            teams = data.team_count(),
            "loaded directory entries"
        );
        Ok(data)
    }

    /// Parse and validate directory TOML from a string.
    pub fn parse(contents: &str) -> Result<DirectoryData, DirectoryFileError> {
        let data: DirectoryData =
            toml::from_str(contents).map_err(|e| DirectoryFileError::ParseError(e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    /// Save the directory back to disk in TOML format.
    pub fn save<P: AsRef<Path>>(path: P, data: &DirectoryData) -> Result<(), DirectoryFileError> {
        let path = path.as_ref();
        info!(path = %path.display(), "saving directory file");

        let toml_str =
            toml::to_string_pretty(data).map_err(|e| DirectoryFileError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_str)?;

        debug!(orgs = data.orgs.len(), "saved directory entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_directory_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.toml");

        let content = r#"
[orgs.acme]
teams = ["frontend", "Platform-Core"]

[orgs.globex]
teams = ["ops"]
"#;
        std::fs::write(&path, content).unwrap();

        let data = DirectoryFile::load(&path).unwrap();
        assert_eq!(data.orgs.len(), 2);
        assert_eq!(data.orgs["acme"].teams, vec!["frontend", "Platform-Core"]);
        assert_eq!(data.team_count(), 3);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.toml");

        let mut data = DirectoryData::default();
        data.orgs.insert(
            "initech".to_string(),
            OrgEntry {
                teams: vec!["tps-reports".to_string()],
            },
        );

        DirectoryFile::save(&path, &data).unwrap();

        let reloaded = DirectoryFile::load(&path).unwrap();
        assert_eq!(reloaded, data);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = DirectoryFile::load("/nonexistent/directory.toml");
        assert!(matches!(result, Err(DirectoryFileError::FileError { .. })));
    }

    #[test]
    fn test_load_empty_file() {
        let data = DirectoryFile::parse("").unwrap();
        assert!(data.orgs.is_empty());
    }

    #[test]
    fn test_rejects_case_insensitive_duplicate_teams() {
        let result = DirectoryFile::parse(
            r#"
[orgs.acme]
teams = ["Ops", "ops"]
"#,
        );
        assert!(matches!(
            result,
            Err(DirectoryFileError::InvalidEntry { ref entry, .. }) if entry == "acme/ops"
        ));
    }

    #[test]
    fn test_rejects_case_insensitive_duplicate_logins() {
        let result = DirectoryFile::parse(
            r#"
[orgs.Acme]
teams = []

[orgs.acme]
teams = []
"#,
        );
        assert!(matches!(result, Err(DirectoryFileError::InvalidEntry { .. })));
    }

    #[test]
    fn test_parse_error() {
        let result = DirectoryFile::parse("[orgs.acme\nteams = 1");
        assert!(matches!(result, Err(DirectoryFileError::ParseError(_))));
    }
}
