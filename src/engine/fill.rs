//! Substitution of values at recorded locations.

use crate::document::Docx;
use crate::domain::{LocationType, PlaceholderLocation, ValueFormatter};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Outcome of a substitution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Locations whose token was replaced
    pub substituted: usize,
    /// Locations whose position or token no longer exists
    pub skipped: usize,
}

impl FillReport {
    pub fn has_substitutions(&self) -> bool {
        self.substituted > 0
    }
}

/// Applies `values` to every location of `locations` in the live document.
///
/// Locations are processed grouped by type. A location is skipped when its
/// position is gone or its token is no longer present in the paragraph; both
/// are normal after the document changed shape or an earlier location in the
/// same paragraph already replaced the token.
pub fn apply(
    docx: &mut Docx,
    locations: &[PlaceholderLocation],
    values: &BTreeMap<String, String>,
    formatter: &ValueFormatter,
) -> FillReport {
    let mut report = FillReport::default();
    let mut formatted: HashMap<&str, Cow<'_, str>> = HashMap::new();

    for location_type in LocationType::ALL {
        for location in locations
            .iter()
            .filter(|loc| loc.location_type() == location_type)
        {
            let key = location.key();
            let Some(raw) = values.get(key) else {
                continue;
            };
            let value: &str = &**formatted
                .entry(key)
                .or_insert_with(|| formatter.format(key, raw));

            let Some(mut paragraphs) = docx.locate_mut(&location.coordinates()) else {
                tracing::debug!(key, coordinates = ?location.coordinates(), "position no longer exists");
                report.skipped += 1;
                continue;
            };

            let mut replaced = false;
            for paragraph in paragraphs.iter_mut() {
                replaced |= paragraph.replace_token(key, value);
            }

            if replaced {
                report.substituted += 1;
            } else {
                tracing::debug!(key, coordinates = ?location.coordinates(), "token no longer present");
                report.skipped += 1;
            }
        }
    }

    report
}
