//! Splits display text into literal and markup spans.
//!
//! Markup is anything a translator must not touch: angle-bracket tags
//! (`<color is="red">`, `</color>`, `<item is="x"/>`), status codes in square
//! brackets (`[TMP]`, `[WIP]`) and the two-character `\n` escape, optionally
//! padded with one space on each side.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub content: String,
    pub is_markup: bool,
}

impl Segment {
    fn literal(s: &str) -> Self {
        Segment {
            content: s.to_string(),
            is_markup: false,
        }
    }

    fn markup(s: &str) -> Self {
        Segment {
            content: s.to_string(),
            is_markup: true,
        }
    }

    /// Literal text that is more than whitespace.
    pub fn has_words(&self) -> bool {
        !self.is_markup && !self.content.trim().is_empty()
    }
}

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Alternation order matters: at a space the padded escape is the only
        // candidate, so ` \n ` is taken whole when both neighbours are spaces.
        Regex::new(r"(?i)<[^>]+>|\[[A-Z]+\]|\\n| \\n ").expect("markup pattern compiles")
    })
}

pub fn tokenize(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last_end = 0;

    for m in markup_re().find_iter(text) {
        if m.start() > last_end {
            out.push(Segment::literal(&text[last_end..m.start()]));
        }
        out.push(Segment::markup(m.as_str()));
        last_end = m.end();
    }

    if last_end < text.len() {
        out.push(Segment::literal(&text[last_end..]));
    }

    out
}

pub fn has_markup(text: &str) -> bool {
    markup_re().is_match(text)
}

/// Markup spans of `text` in order, used to verify a translation kept them.
pub fn markup_of(text: &str) -> Vec<&str> {
    markup_re().find_iter(text).map(|m| m.as_str()).collect()
}
