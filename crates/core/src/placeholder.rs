//! Placeholder parsing and substitution.
//!
//! A placeholder is a `{{ name }}` marker embedded in a path segment or a
//! line of text. Parsing never fails: an unterminated `{{` is literal text,
//! not an error. Substitution leaves markers without a value untouched so
//! partially resolved strings stay renderable.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

// The inner part may not contain braces, so a marker never spans another
// marker and matching stays within a single path segment or content line.
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").unwrap());

/// Extract the variable names referenced by `input`.
///
/// Names are trimmed of surrounding whitespace and returned in
/// first-occurrence order; a name repeated within the same input is reported
/// once. Whitespace-only markers are not references.
pub fn parse_names(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for caps in PLACEHOLDER_RE.captures_iter(input) {
        let name = caps[1].trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}

/// Replace every resolvable placeholder in `input` with its value.
///
/// A marker whose trimmed name has no entry in `values` is left exactly as
/// written.
pub fn substitute(input: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = caps[1].trim();
            values.get(name).cloned().unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
