//! Team mention core library.
//!
//! This crate finds `@organization/team` mentions in the text of an HTML
//! document, resolves them against an organization/team directory, and
//! rewrites the resolvable ones as styled markup: mention matching,
//! resolution and substitution, the document walker, identity stores
//! (in-memory and SQLite), configuration, and error types.

pub mod config;
pub mod db;
pub mod document;
pub mod errors;
pub mod filter;
pub mod identity;
pub mod mention;
pub mod models;

// Re-exports for convenience.
pub use config::AppConfig;
pub use db::Database;
pub use document::{Document, HtmlDocument};
pub use filter::{FilterContext, FilterResult, TeamMentionFilter};
pub use identity::{IdentityStore, MemoryDirectory};
pub use mention::{find_mentions, MentionToken};
pub use models::{Organization, Team};
