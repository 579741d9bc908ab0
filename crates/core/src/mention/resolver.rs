//! Resolution of mention tokens against an identity store.

use tracing::debug;

use crate::errors::StoreError;
use crate::identity::IdentityStore;
use crate::models::Team;

/// Looks up the team named by an `@org/team` mention.
///
/// An organization or team that does not exist is the ordinary "unresolved"
/// outcome and yields `Ok(None)`. Only a store failure produces `Err`, and it
/// is passed through untouched.
#[derive(Debug, Clone)]
pub struct MentionResolver<S> {
    store: S,
}

impl<S: IdentityStore> MentionResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve `org_login`/`team_name` to a team, ignoring ASCII case.
    pub fn resolve(&self, org_login: &str, team_name: &str) -> Result<Option<Team>, StoreError> {
        let Some(organization) = self.store.find_organization_by_login(org_login)? else {
            debug!(org = org_login, team = team_name, "mention names unknown organization");
            return Ok(None);
        };

        let team = self.store.find_team_by_name(&organization, team_name)?;
        match &team {
            Some(t) => debug!(team = %t.slug(), id = t.id, "resolved mention"),
            None => debug!(org = %organization.login, team = team_name, "mention names unknown team"),
        }
        Ok(team)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
