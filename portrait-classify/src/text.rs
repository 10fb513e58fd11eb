//! README preparation shared by both strategies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters of README text sent for classification.
pub const DEFAULT_README_CHAR_LIMIT: usize = 1500;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip code blocks, badges, link targets and markup, collapse whitespace.
pub fn clean_readme(raw: &str) -> String {
    let text = CODE_FENCE.replace_all(raw, " ");
    let text = IMAGE.replace_all(&text, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = URL.replace_all(&text, " ");
    let text = HTML_TAG.replace_all(&text, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// First `limit` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Cleaned and truncated classification text.
pub fn prepare(raw: &str, limit: usize) -> String {
    truncate_chars(&clean_readme(raw), limit).to_string()
}
