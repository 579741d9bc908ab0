//! Identity entities referenced by mentions.
//!
//! Organizations and teams are owned by the identity store; the mention
//! filter only ever holds copies returned from a lookup.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// An organization, keyed by a case-insensitive login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Organization {
    /// Stable store identifier.
    pub id: i64,
    /// Canonical login as stored (original casing).
    pub login: String,
}

impl Organization {
    pub fn new(id: i64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team belonging to exactly one organization.
///
/// Two `Team` values denote the same team when their `id`s are equal; this
/// is the identity used to de-duplicate mentions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Team {
    /// Stable store identifier.
    pub id: i64,
    /// Owning organization.
    pub organization: Organization,
    /// Canonical team name as stored (original casing).
    pub name: String,
}

impl Team {
    pub fn new(id: i64, organization: Organization, name: impl Into<String>) -> Self {
        Self {
            id,
            organization,
            name: name.into(),
        }
    }

    /// `org/team` using canonical casing.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.organization.login, self.name)
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}/{}", self.organization.login, self.name)
    }
}
