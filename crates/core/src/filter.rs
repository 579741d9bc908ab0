//! The team mention filter: one pass over a document's text nodes.
//!
//! [`TeamMentionFilter::call`] walks every text node in document order,
//! skips nodes that cannot contain a mention or sit inside an ignored
//! element, runs the [`Substitutor`] on the rest, and writes changed markup
//! back. The teams it resolved come back in a [`FilterResult`] built fresh
//! for each call.
//!
//! The set of text nodes is captured before the first rewrite, so markup
//! inserted during a pass is never visited by that pass. Text inside an
//! element carrying [`MENTION_CLASS`] is skipped as well, so filtering
//! already-filtered output leaves it unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{AppConfig, FilterConfig};
use crate::document::{Document, HtmlDocument};
use crate::errors::{CoreError, FilterError};
use crate::identity::{self, IdentityStore};
use crate::mention::{
    MentionRenderer, MentionResolver, MentionedTeams, RenderStyle, Substitutor, MENTION_CLASS,
};
use crate::models::Team;

/// Per-run options handed to the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterContext {
    /// Base URL for rendered team links.
    pub base_url: String,
    pub render: RenderStyle,
    /// Element names (case-insensitive) whose text is left alone.
    pub ignored_ancestors: Vec<String>,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for FilterContext {
    fn from(config: &FilterConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            render: config.render,
            ignored_ancestors: config.ignored_ancestors.clone(),
        }
    }
}

/// What a filter run leaves behind for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Resolved teams, one entry per team, in order of first mention.
    pub mentioned_teams: Vec<Team>,
}

/// Replaces `@org/team` mentions in HTML with team markup.
pub struct TeamMentionFilter<S> {
    resolver: MentionResolver<S>,
    renderer: MentionRenderer,
    ignored_ancestors: Vec<String>,
}

impl<S: IdentityStore> TeamMentionFilter<S> {
    pub fn new(store: S, context: FilterContext) -> Self {
        Self {
            resolver: MentionResolver::new(store),
            renderer: MentionRenderer::new(context.render, &context.base_url),
            ignored_ancestors: context.ignored_ancestors,
        }
    }

    /// Run one pass over `doc`, rewriting it in place.
    ///
    /// Store and document failures abort the pass and are returned as is;
    /// nodes rewritten before the failure stay rewritten.
    pub fn call<D: Document>(&self, doc: &mut D) -> Result<FilterResult, FilterError> {
        let substitutor = Substitutor::new(&self.resolver, &self.renderer);
        let mut mentioned = MentionedTeams::new();
        let mut rewritten = 0usize;

        for node in doc.text_nodes() {
            let content = doc.text_html(node)?;
            if !content.contains('@') {
                continue;
            }
            if self.has_ignored_ancestor(&*doc, node)? {
                trace!(node = ?node, "skipping text inside ignored element");
                continue;
            }

            let html = substitutor.substitute(&content, &mut mentioned)?;
            if html == content {
                continue;
            }
            doc.replace_with_html(node, &html)?;
            debug!(node = ?node, "rewrote text node");
            rewritten += 1;
        }

        mentioned.dedup();
        debug!(
            rewritten,
            teams = mentioned.len(),
            "team mention filter pass complete"
        );
        Ok(FilterResult {
            mentioned_teams: mentioned.into_vec(),
        })
    }

    /// Parse an HTML fragment, filter it, and serialize the result.
    pub fn filter_fragment(&self, html: &str) -> Result<(String, FilterResult), FilterError> {
        let mut doc = HtmlDocument::parse_fragment(html);
        let result = self.call(&mut doc)?;
        Ok((doc.to_html(), result))
    }

    /// Parse a full HTML document, filter it, and serialize the result.
    pub fn filter_document(&self, html: &str) -> Result<(String, FilterResult), FilterError> {
        let mut doc = HtmlDocument::parse(html);
        let result = self.call(&mut doc)?;
        Ok((doc.to_html(), result))
    }

    pub fn resolver(&self) -> &MentionResolver<S> {
        &self.resolver
    }

    fn has_ignored_ancestor<D: Document>(&self, doc: &D, node: D::NodeId) -> Result<bool, FilterError> {
        let ancestors = doc.ancestors(node)?;
        Ok(ancestors.iter().any(|element| {
            element.has_class(MENTION_CLASS)
                || self
                    .ignored_ancestors
                    .iter()
                    .any(|tag| tag.eq_ignore_ascii_case(element.name))
        }))
    }
}

impl TeamMentionFilter<Box<dyn IdentityStore>> {
    /// Build a filter over the directory and options named in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let store = identity::open_store(&config.directory)?;
        Ok(Self::new(store, FilterContext::from(&config.filter)))
    }
}
