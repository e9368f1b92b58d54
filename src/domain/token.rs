//! Placeholder token rule.
//!
//! A token is `#` followed by one or more word characters. Matching is
//! case-sensitive and runs over the assembled text of a paragraph, so run
//! boundaries inside the paragraph never split a token.

use once_cell::sync::Lazy;
use regex::Regex;

/// Finds placeholder tokens in text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderMatcher;

impl PlaceholderMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Returns the token regex.
    pub fn pattern() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"#\w+").expect("Valid placeholder regex"));
        &PATTERN
    }

    fn whole() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^#\w+$").expect("Valid placeholder regex"));
        &PATTERN
    }

    /// All non-overlapping tokens in `text`, left to right.
    pub fn extract_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        Self::pattern().find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Returns true when `candidate` is exactly one token.
    pub fn is_placeholder(candidate: &str) -> bool {
        Self::whole().is_match(candidate)
    }
}
