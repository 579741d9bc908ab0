//! Mention detection, resolution and substitution.
//!
//! Processing is split into three independent steps:
//! 1. [`matcher`] finds `@org/team` tokens in a string
//! 2. [`resolver`] asks the identity store whether a token names a real team
//! 3. [`substitutor`] splices rendered markup in place of resolved tokens and
//!    records the teams in a [`MentionedTeams`] accumulator

pub mod matcher;
pub mod resolver;
pub mod substitutor;

pub use matcher::{find_mentions, MentionToken, Mentions};
pub use resolver::MentionResolver;
pub use substitutor::{MentionRenderer, MentionedTeams, RenderStyle, Substitutor, MENTION_CLASS};
