//! Text helpers for embedding user-derived strings in hook output.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));
static QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["'`]"#).expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Flatten to one line and strip quotes so the text can sit inside a quoted
/// argument of an instruction.
pub fn sanitize_for_display(text: &str) -> String {
    let text = LINE_BREAKS.replace_all(text, " ");
    let text = QUOTES.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Shorten to at most `max` characters, ending in `…` when cut.
///
/// Empty input renders as `...`.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.is_empty() {
        return "...".to_string();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = truncate_chars(text, max.saturating_sub(1));
    out.push('…');
    out
}
