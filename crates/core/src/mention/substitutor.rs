//! Replacement of resolved mentions with rendered markup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::matcher::find_mentions;
use super::resolver::MentionResolver;
use crate::errors::StoreError;
use crate::identity::IdentityStore;
use crate::models::Team;

/// Class attached to every rendered mention. Text inside an element carrying
/// it is never rewritten again.
pub const MENTION_CLASS: &str = "team-mention";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Markup produced for a resolved mention.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// `<span class='team-mention'>@org/team</span>`
    #[default]
    Span,
    /// `<a href='{base_url}orgs/org/teams/team' class='team-mention'>@org/team</a>`
    Link,
}

/// Renders the markup for a resolved team using its canonical names.
#[derive(Debug, Clone)]
pub struct MentionRenderer {
    style: RenderStyle,
    base_url: String,
}

impl MentionRenderer {
    /// `base_url` gains a trailing `/` if it lacks one.
    pub fn new(style: RenderStyle, base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { style, base_url }
    }

    pub fn style(&self) -> RenderStyle {
        self.style
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn render(&self, team: &Team) -> String {
        let text = html_escape::encode_text(&team.to_string()).into_owned();
        match self.style {
            RenderStyle::Span => format!("<span class='{}'>{}</span>", MENTION_CLASS, text),
            RenderStyle::Link => {
                let href = format!(
                    "{}orgs/{}/teams/{}",
                    self.base_url, team.organization.login, team.name
                );
                format!(
                    "<a href='{}' class='{}'>{}</a>",
                    html_escape::encode_single_quoted_attribute(&href),
                    MENTION_CLASS,
                    text
                )
            }
        }
    }
}

impl Default for MentionRenderer {
    fn default() -> Self {
        Self::new(RenderStyle::Span, "/")
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Teams mentioned and resolved during one filter run.
///
/// Entries are appended as mentions resolve; [`dedup`](Self::dedup) collapses
/// entries that refer to the same team id, keeping first-mention order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionedTeams {
    teams: Vec<Team>,
}

impl MentionedTeams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, team: Team) {
        self.teams.push(team);
    }

    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.teams.retain(|team| seen.insert(team.id));
    }

    pub fn clear(&mut self) {
        self.teams.clear();
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn as_slice(&self) -> &[Team] {
        &self.teams
    }

    pub fn into_vec(self) -> Vec<Team> {
        self.teams
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Rewrites the mentions in a piece of text that resolve to real teams.
pub struct Substitutor<'a, S> {
    resolver: &'a MentionResolver<S>,
    renderer: &'a MentionRenderer,
}

impl<'a, S: IdentityStore> Substitutor<'a, S> {
    pub fn new(resolver: &'a MentionResolver<S>, renderer: &'a MentionRenderer) -> Self {
        Self { resolver, renderer }
    }

    /// Return `text` with every resolvable mention replaced by rendered
    /// markup, pushing each resolved team onto `mentioned`.
    ///
    /// Unresolved mentions and all text between mentions, including the
    /// boundary characters around each token, are copied through unchanged.
    pub fn substitute(&self, text: &str, mentioned: &mut MentionedTeams) -> Result<String, StoreError> {
        let mut output = String::with_capacity(text.len());
        let mut copied_to = 0;

        for token in find_mentions(text) {
            let Some(team) = self.resolver.resolve(token.org_name, token.team_name)? else {
                trace!(mention = token.full_match, "leaving unresolved mention");
                continue;
            };

            output.push_str(&text[copied_to..token.start]);
            output.push_str(&self.renderer.render(&team));
            copied_to = token.end;
            mentioned.push(team);
        }

        if copied_to == 0 {
            return Ok(text.to_string());
        }
        output.push_str(&text[copied_to..]);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryDirectory;
    use crate::models::Organization;

    fn resolver() -> MentionResolver<MemoryDirectory> {
        let mut dir = MemoryDirectory::new();
        let acme = dir.add_organization("acme").unwrap();
        dir.add_team(&acme, "frontend").unwrap();
        dir.add_team(&acme, "Platform").unwrap();
        MentionResolver::new(dir)
    }

    fn run(text: &str) -> (String, MentionedTeams) {
        let resolver = resolver();
        let renderer = MentionRenderer::default();
        let mut mentioned = MentionedTeams::new();
        let out = Substitutor::new(&resolver, &renderer)
            .substitute(text, &mut mentioned)
            .unwrap();
        (out, mentioned)
    }

    #[test]
    fn test_replaces_resolved_mention() {
        let (out, mentioned) = run("Thanks @acme/frontend for the review.");
        assert_eq!(
            out,
            "Thanks <span class='team-mention'>@acme/frontend</span> for the review."
        );
        assert_eq!(mentioned.len(), 1);
        assert_eq!(mentioned.as_slice()[0].slug(), "acme/frontend");
    }

    #[test]
    fn test_unresolved_mention_passes_through() {
        let (out, mentioned) = run("cc @acme/ghost");
        assert_eq!(out, "cc @acme/ghost");
        assert!(mentioned.is_empty());
    }

    #[test]
    fn test_text_without_at_is_unchanged() {
        let (out, mentioned) = run("plain & simple");
        assert_eq!(out, "plain & simple");
        assert!(mentioned.is_empty());
    }

    #[test]
    fn test_uses_canonical_casing() {
        let (out, _) = run("ping @ACME/platform");
        assert_eq!(out, "ping <span class='team-mention'>@acme/Platform</span>");
    }

    #[test]
    fn test_trailing_dot_stays_outside_fragment() {
        let (out, _) = run("ping @acme/frontend.");
        assert_eq!(out, "ping <span class='team-mention'>@acme/frontend</span>.");
    }

    #[test]
    fn test_leading_boundary_is_preserved() {
        let (out, _) = run("(@acme/frontend)");
        assert_eq!(out, "(<span class='team-mention'>@acme/frontend</span>)");
    }

    #[test]
    fn test_mixed_resolved_and_unresolved() {
        let (out, mentioned) = run("@acme/ghost @acme/frontend @globex/ops");
        assert_eq!(
            out,
            "@acme/ghost <span class='team-mention'>@acme/frontend</span> @globex/ops"
        );
        assert_eq!(mentioned.len(), 1);
    }

    #[test]
    fn test_repeat_mentions_accumulate_until_dedup() {
        let (_, mut mentioned) = run("@acme/frontend and @Acme/Frontend");
        assert_eq!(mentioned.len(), 2);
        mentioned.dedup();
        assert_eq!(mentioned.len(), 1);
    }

    #[test]
    fn test_dedup_keeps_first_mention_order() {
        let org = Organization::new(1, "acme");
        let a = Team::new(2, org.clone(), "a");
        let b = Team::new(3, org, "b");
        let mut mentioned = MentionedTeams::new();
        mentioned.push(b.clone());
        mentioned.push(a.clone());
        mentioned.push(b.clone());
        mentioned.dedup();
        assert_eq!(mentioned.into_vec(), vec![b, a]);
    }

    #[test]
    fn test_link_style() {
        let renderer = MentionRenderer::new(RenderStyle::Link, "https://github.example.com");
        assert_eq!(renderer.base_url(), "https://github.example.com/");

        let team = Team::new(2, Organization::new(1, "acme"), "frontend");
        assert_eq!(
            renderer.render(&team),
            "<a href='https://github.example.com/orgs/acme/teams/frontend' class='team-mention'>@acme/frontend</a>"
        );
    }

    #[test]
    fn test_render_escapes_canonical_names() {
        let team = Team::new(2, Organization::new(1, "acme"), "R&D");
        assert_eq!(
            MentionRenderer::default().render(&team),
            "<span class='team-mention'>@acme/R&amp;D</span>"
        );
    }
}
