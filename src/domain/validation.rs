//! Fill request validation.
//!
//! The check is three set operations composed in a fixed order. The first
//! class that is non-empty is reported and the rest are not evaluated:
//! missing values, then unknown keys, then blank values.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// A rejected fill request, carrying the offending keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Template placeholders with no supplied value
    #[error("Missing values for placeholders: {}", KeyList(.0))]
    MissingValue(BTreeSet<String>),

    /// Supplied keys that the template does not contain
    #[error("Unknown placeholders: {}", KeyList(.0))]
    UnknownKey(BTreeSet<String>),

    /// Supplied values that are blank after trimming
    #[error("Empty values for placeholders: {}", KeyList(.0))]
    EmptyValue(BTreeSet<String>),
}

impl ValidationFailure {
    pub fn keys(&self) -> &BTreeSet<String> {
        match self {
            Self::MissingValue(keys) | Self::UnknownKey(keys) | Self::EmptyValue(keys) => keys,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingValue(_) => "MISSING_VALUE",
            Self::UnknownKey(_) => "UNKNOWN_KEY",
            Self::EmptyValue(_) => "EMPTY_VALUE",
        }
    }
}

struct KeyList<'a>(&'a BTreeSet<String>);

impl fmt::Display for KeyList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(key)?;
        }
        Ok(())
    }
}

/// Checks a value mapping against the distinct keys of a template.
pub fn validate(
    template_keys: &BTreeSet<String>,
    values: &BTreeMap<String, String>,
) -> Result<(), ValidationFailure> {
    let request_keys: BTreeSet<String> = values.keys().cloned().collect();

    let missing: BTreeSet<String> = template_keys.difference(&request_keys).cloned().collect();
    if !missing.is_empty() {
        return Err(ValidationFailure::MissingValue(missing));
    }

    let unknown: BTreeSet<String> = request_keys.difference(template_keys).cloned().collect();
    if !unknown.is_empty() {
        return Err(ValidationFailure::UnknownKey(unknown));
    }

    let empty: BTreeSet<String> = values
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key.clone())
        .collect();
    if !empty.is_empty() {
        return Err(ValidationFailure::EmptyValue(empty));
    }

    Ok(())
}
