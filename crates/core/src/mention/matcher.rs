//! Detection of `@organization/team` mention tokens in plain text.
//!
//! The matcher knows nothing about HTML or about whether a mention resolves.
//! It yields [`MentionToken`]s lazily, left to right, with byte offsets into
//! the input so a caller can splice replacements without re-scanning.

use std::sync::OnceLock;

use regex_lite::Regex;

/// Shape of a mention once the `@` is found. The boundary before the `@`
/// and the lookahead after the team are checked by hand since `regex-lite`
/// has no lookaround.
const MENTION_SHAPE: &str = r"@([A-Za-z0-9][A-Za-z0-9-]+)/([A-Za-z0-9][A-Za-z0-9-]+)";

/// Shortest accepted team name.
const MIN_TEAM_LEN: usize = 2;

fn mention_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(MENTION_SHAPE).expect("mention shape pattern is valid"))
}

/// A single `@org/team` occurrence.
///
/// `start` is the byte offset of the `@`; `end` is one past the last byte of
/// the team name. Boundary characters on either side are not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionToken<'t> {
    pub full_match: &'t str,
    pub org_name: &'t str,
    pub team_name: &'t str,
    pub start: usize,
    pub end: usize,
}

/// Iterator over the mentions in a string. See [`find_mentions`].
#[derive(Debug, Clone)]
pub struct Mentions<'t> {
    text: &'t str,
    /// Where the next search begins.
    pos: usize,
    /// End of the previous accepted mention. A boundary character before
    /// this offset has already been consumed and cannot open a new mention.
    last_end: usize,
}

/// Find every mention in `text`, in order of appearance.
///
/// The iterator borrows `text` and holds no other state, so calling this
/// again on the same input yields the same tokens.
pub fn find_mentions(text: &str) -> Mentions<'_> {
    Mentions {
        text,
        pos: 0,
        last_end: 0,
    }
}

impl<'t> Iterator for Mentions<'t> {
    type Item = MentionToken<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.text;

        while self.pos < text.len() {
            let caps = mention_shape().captures_at(text, self.pos)?;
            let whole = caps.get(0)?;
            let org = caps.get(1)?;
            let team = caps.get(2)?;
            let start = whole.start();

            if !opens_mention(text, start, self.last_end) {
                self.pos = start + 1;
                continue;
            }

            let Some(end) = accepted_team_end(text, team.start(), team.end()) else {
                self.pos = start + 1;
                continue;
            };

            self.pos = end;
            self.last_end = end;
            return Some(MentionToken {
                full_match: &text[start..end],
                org_name: org.as_str(),
                team_name: &text[team.start()..end],
                start,
                end,
            });
        }

        None
    }
}

impl std::iter::FusedIterator for Mentions<'_> {}

/// An `@` at `at` may open a mention when it starts the string or follows a
/// non-word character that the previous mention did not consume.
fn opens_mention(text: &str, at: usize, last_end: usize) -> bool {
    if at == 0 {
        return true;
    }
    let before = at - 1;
    before >= last_end && !is_word_byte(text.as_bytes()[before])
}

/// Longest team end in `min..=greedy_end` whose trailing boundary holds.
fn accepted_team_end(text: &str, team_start: usize, greedy_end: usize) -> Option<usize> {
    let shortest = team_start + MIN_TEAM_LEN;
    (shortest..=greedy_end)
        .rev()
        .find(|&end| boundary_follows(text, end))
}

/// Lookahead after a team name: `.` then whitespace, `.` at end of input,
/// any byte that is not a word character or `.`, or end of input.
fn boundary_follows(text: &str, at: usize) -> bool {
    let bytes = text.as_bytes();
    match bytes.get(at) {
        None => true,
        Some(b'.') => match bytes.get(at + 1) {
            None => true,
            Some(next) => next.is_ascii_whitespace(),
        },
        Some(&b) => !is_word_byte(b),
    }
}

/// ASCII word character. Bytes of multi-byte UTF-8 sequences are never word
/// bytes.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
