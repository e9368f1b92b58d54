//! Domain models and business logic for placeholder templates.
//!
//! This module holds everything that does not touch document bytes or
//! storage: the location record model, the token rule, the fill request
//! validator and the value formatter.

pub mod format;
pub mod location;
pub mod token;
pub mod validation;

pub use format::{DateLocale, ValueFormatter};
pub use location::{
    Coordinates, DocumentId, LocationRecord, LocationType, PerTypeCounts, PlaceholderLocation,
    ScanStatistics,
};
pub use token::PlaceholderMatcher;
pub use validation::{validate, ValidationFailure};

use std::collections::BTreeSet;

/// Distinct keys among a set of locations, in lexicographic order.
pub fn distinct_keys(locations: &[PlaceholderLocation]) -> BTreeSet<String> {
    locations.iter().map(|loc| loc.key().to_string()).collect()
}
