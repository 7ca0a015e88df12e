//! Text cleanup for revealed panels and slugs for image context.

use regex::Regex;
use std::sync::OnceLock;

/// Longest slug produced by [`slugify_context`].
const SLUG_MAX_CHARS: usize = 30;

/// Leading chars of a block's text used as image context.
pub const CONTEXT_PREFIX_CHARS: usize = 50;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{3,}").expect("static regex"))
}

fn newline_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

fn non_alphanumeric_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("static regex"))
}

/// Strips boilerplate phrases and collapses whitespace in extracted text.
#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    boilerplate: Vec<Regex>,
}

impl TextCleaner {
    pub fn new(boilerplate: Vec<Regex>) -> Self {
        Self { boilerplate }
    }

    /// Remove boilerplate, collapse runs of 3+ whitespace to a space and
    /// runs of 3+ newlines to a blank line, then trim.
    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.trim().to_string();
        for pattern in &self.boilerplate {
            text = pattern.replace_all(&text, "").into_owned();
        }
        let text = whitespace_run().replace_all(&text, " ");
        let text = newline_run().replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

/// The first `n` chars of `s`.
pub fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Slug for an image's surrounding text: alphanumeric runs joined by `-`,
/// cut to 30 chars and lowercased. Empty when the text has no content.
pub fn slugify_context(block_text: &str) -> String {
    let context = prefix_chars(block_text, CONTEXT_PREFIX_CHARS).trim();
    let replaced = non_alphanumeric_run().replace_all(context, "-");
    prefix_chars(&replaced, SLUG_MAX_CHARS).to_lowercase()
}
