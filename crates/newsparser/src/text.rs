// ABOUTME: Pure string utilities shared by the site extractors.
// ABOUTME: Hidden-character stripping, whitespace collapsing, comma-separated lists and hash fingerprints.

use once_cell::sync::Lazy;
use regex::Regex;

static HIDDEN_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x{000D}\x{000A}|[\x{000A}\x{000B}\x{000C}\x{000D}\x{0085}\x{2028}\x{2029}]")
        .expect("hidden character pattern is valid")
});

static MULTI_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("multi-space pattern is valid"));

/// Removes line breaks and Unicode line/paragraph separators.
pub fn strip_hidden_chars(s: &str) -> String {
    HIDDEN_CHARS.replace_all(s, "").into_owned()
}

/// Collapses runs of two or more whitespace characters into one space.
pub fn collapse_spaces(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").into_owned()
}

/// Drops newlines, collapses whitespace runs and trims.
pub fn clean_paragraph(s: &str) -> String {
    collapse_spaces(&s.replace('\n', "")).trim().to_string()
}

/// Like [`clean_paragraph`] but keeps word boundaries across line breaks.
pub fn clean_paragraph_spaced(s: &str) -> String {
    collapse_spaces(s).replace('\n', " ").trim().to_string()
}

/// Splits a text blob into trimmed, non-empty lines.
///
/// `\r\n` and non-breaking spaces both count as line breaks.
pub fn split_lines(s: &str) -> Vec<String> {
    s.replace("\r\n", "\n")
        .replace('\u{a0}', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a comma-separated list, trimming items and dropping empty ones.
///
/// Items that still carry literal `\uXXXX` escapes are unescaped.
pub fn parse_csl(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            if item.contains("\\u") {
                unescape_unicode(item)
            } else {
                item.to_string()
            }
        })
        .collect()
}

/// Decodes literal `\uXXXX` escapes, leaving the input untouched if any escape is malformed.
pub fn unescape_unicode(s: &str) -> String {
    let quoted = format!("\"{}\"", s.replace('"', "\\\""));
    serde_json::from_str::<String>(&quoted).unwrap_or_else(|_| s.to_string())
}

/// Keeps only alphanumeric characters (CJK ideographs included).
pub fn fingerprint(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Returns the first `n` characters and the count of the remainder.
pub fn truncate_chars(s: &str, n: usize) -> (String, usize) {
    let total = s.chars().count();
    if total <= n {
        (s.to_string(), 0)
    } else {
        (s.chars().take(n).collect(), total - n)
    }
}
