//! Search-term extraction for memory queries.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"));
static TECH_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(implement|create|add|fix|refactor|update|build|api|hook|component|service|database|auth|test|feature|endpoint|migration)\w*",
    )
    .expect("valid regex")
});

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "ought", "used", "to", "of", "in", "for", "on", "with", "at", "by",
    "from", "as", "into", "through", "during", "before", "after", "above", "below", "between",
    "and", "but", "or", "nor", "so", "yet", "both", "either", "neither", "not", "only", "own",
    "same", "than", "too", "very", "just", "also", "now", "here", "there", "when", "where",
    "why", "how", "all", "each", "every", "any", "some", "this", "that", "these", "those",
    "what", "which", "who", "whom", "whose", "file", "files", "create", "implement", "add",
    "update", "fix", "change",
];

fn words(text: &str) -> Vec<String> {
    NON_ALNUM
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn push_unique(terms: &mut Vec<String>, term: String) {
    if !term.is_empty() && !terms.contains(&term) {
        terms.push(term);
    }
}

/// Query for a Task: up to five content words of the prompt plus the
/// subagent type (namespace stripped, dashes as spaces).
pub fn task_query(prompt: &str, subagent_type: &str) -> String {
    let snippet: String = prompt.chars().take(200).collect();
    let mut terms = Vec::new();

    for word in words(&snippet)
        .into_iter()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .take(5)
    {
        push_unique(&mut terms, word);
    }

    let agent = subagent_type.rsplit(':').next().unwrap_or_default();
    for part in agent.split('-') {
        push_unique(&mut terms, part.to_string());
    }

    let query = terms.join(" ").trim().to_string();
    if query.is_empty() {
        "organizational context".to_string()
    } else {
        query
    }
}

/// Up to five words longer than three characters.
pub fn prompt_terms(prompt: &str) -> String {
    words(prompt)
        .into_iter()
        .filter(|w| w.len() > 3)
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Up to five distinct engineering terms, else the first 50 characters.
pub fn tech_terms(text: &str) -> String {
    let mut terms = Vec::new();
    for m in TECH_TERMS.find_iter(text) {
        push_unique(&mut terms, m.as_str().to_lowercase());
    }
    terms.truncate(5);

    if terms.is_empty() {
        text.chars().take(50).collect()
    } else {
        terms.join(" ")
    }
}
