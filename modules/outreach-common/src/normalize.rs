//! Canonical form for free-text city identifiers.
//!
//! Lowercase, trim, and fold every run of non-alphanumeric characters
//! (whitespace, dashes, underscores, dots, slashes, punctuation) into a single
//! `_`. `"New York"`, `"new-york"` and `"new_york"` all become `new_york`;
//! `"newyork"` stays distinct. The output is also a safe directory name.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    SEPARATOR_RE
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Human form of a normalized key: `"sao_paulo"` -> `"Sao Paulo"`.
pub fn display_name(key: &str) -> String {
    normalize(key)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
