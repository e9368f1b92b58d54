//! Placeholder location records.
//!
//! A location is one occurrence of a token at a structural coordinate. The
//! coordinate is a tagged enum: the variant is the location type and carries
//! exactly the indices that are meaningful for it.

use super::token::PlaceholderMatcher;
use crate::error::{FillerError, FillerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DocumentId {
    type Err = FillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| FillerError::invalid_input("document id", e.to_string()))
    }
}

/// Section kind a placeholder was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Header,
    Paragraph,
    Table,
    Footer,
}

impl LocationType {
    /// All types in scan traversal order.
    pub const ALL: [LocationType; 4] = [Self::Header, Self::Paragraph, Self::Table, Self::Footer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Paragraph => "paragraph",
            Self::Table => "table",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = FillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(Self::Header),
            "paragraph" => Ok(Self::Paragraph),
            "table" => Ok(Self::Table),
            "footer" => Ok(Self::Footer),
            other => Err(FillerError::invalid_input(
                "location type",
                format!("unknown location type '{}'", other),
            )),
        }
    }
}

/// Structural coordinate of a paragraph (or, for tables, a cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Coordinates {
    Header {
        header_index: usize,
        paragraph_index: usize,
    },
    Paragraph {
        paragraph_index: usize,
    },
    /// Addresses a whole cell; every paragraph in it is a candidate.
    Table {
        table_index: usize,
        row_index: usize,
        column_index: usize,
    },
    Footer {
        footer_index: usize,
        paragraph_index: usize,
    },
}

impl Coordinates {
    pub fn location_type(&self) -> LocationType {
        match self {
            Self::Header { .. } => LocationType::Header,
            Self::Paragraph { .. } => LocationType::Paragraph,
            Self::Table { .. } => LocationType::Table,
            Self::Footer { .. } => LocationType::Footer,
        }
    }
}

/// One occurrence of a placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderLocation {
    document_id: DocumentId,
    key: String,
    coordinates: Coordinates,
}

impl PlaceholderLocation {
    /// Creates a location, rejecting keys that are not a single token.
    pub fn new(
        document_id: DocumentId,
        key: impl Into<String>,
        coordinates: Coordinates,
    ) -> FillerResult<Self> {
        let key = key.into();
        if !PlaceholderMatcher::is_placeholder(&key) {
            return Err(FillerError::invalid_input(
                "key",
                format!("'{}' is not a placeholder token", key),
            ));
        }
        Ok(Self {
            document_id,
            key,
            coordinates,
        })
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn location_type(&self) -> LocationType {
        self.coordinates.location_type()
    }
}

/// Flat, serializable view of a location, as persisted and printed.
///
/// Only the indices belonging to `location_type` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub document_id: DocumentId,
    pub key: String,
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_index: Option<usize>,
}

impl From<&PlaceholderLocation> for LocationRecord {
    fn from(loc: &PlaceholderLocation) -> Self {
        let mut record = LocationRecord {
            document_id: loc.document_id,
            key: loc.key.clone(),
            location_type: loc.location_type(),
            header_index: None,
            paragraph_index: None,
            table_index: None,
            row_index: None,
            column_index: None,
            footer_index: None,
        };
        match loc.coordinates {
            Coordinates::Header {
                header_index,
                paragraph_index,
            } => {
                record.header_index = Some(header_index);
                record.paragraph_index = Some(paragraph_index);
            }
            Coordinates::Paragraph { paragraph_index } => {
                record.paragraph_index = Some(paragraph_index);
            }
            Coordinates::Table {
                table_index,
                row_index,
                column_index,
            } => {
                record.table_index = Some(table_index);
                record.row_index = Some(row_index);
                record.column_index = Some(column_index);
            }
            Coordinates::Footer {
                footer_index,
                paragraph_index,
            } => {
                record.footer_index = Some(footer_index);
                record.paragraph_index = Some(paragraph_index);
            }
        }
        record
    }
}

impl TryFrom<LocationRecord> for PlaceholderLocation {
    type Error = FillerError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let r = &record;
        let coordinates = match (
            r.location_type,
            r.header_index,
            r.paragraph_index,
            r.table_index,
            r.row_index,
            r.column_index,
            r.footer_index,
        ) {
            (LocationType::Header, Some(header_index), Some(paragraph_index), None, None, None, None) => {
                Coordinates::Header {
                    header_index,
                    paragraph_index,
                }
            }
            (LocationType::Paragraph, None, Some(paragraph_index), None, None, None, None) => {
                Coordinates::Paragraph { paragraph_index }
            }
            (
                LocationType::Table,
                None,
                None,
                Some(table_index),
                Some(row_index),
                Some(column_index),
                None,
            ) => Coordinates::Table {
                table_index,
                row_index,
                column_index,
            },
            (LocationType::Footer, None, Some(paragraph_index), None, None, None, Some(footer_index)) => {
                Coordinates::Footer {
                    footer_index,
                    paragraph_index,
                }
            }
            (location_type, ..) => {
                return Err(FillerError::invalid_input(
                    "location record",
                    format!(
                        "index fields do not match location type '{}' for key '{}'",
                        location_type, record.key
                    ),
                ))
            }
        };
        PlaceholderLocation::new(record.document_id, record.key, coordinates)
    }
}

/// Occurrence counts per location type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTypeCounts {
    pub header: usize,
    pub paragraph: usize,
    pub table: usize,
    pub footer: usize,
}

impl PerTypeCounts {
    pub fn get(&self, location_type: LocationType) -> usize {
        match location_type {
            LocationType::Header => self.header,
            LocationType::Paragraph => self.paragraph,
            LocationType::Table => self.table,
            LocationType::Footer => self.footer,
        }
    }

    pub fn sum(&self) -> usize {
        self.header + self.paragraph + self.table + self.footer
    }
}

/// Summary of the stored location set of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total: usize,
    pub distinct_keys: usize,
    pub per_type: PerTypeCounts,
}

impl ScanStatistics {
    pub fn from_locations(locations: &[PlaceholderLocation]) -> Self {
        let mut per_type = PerTypeCounts::default();
        for loc in locations {
            match loc.location_type() {
                LocationType::Header => per_type.header += 1,
                LocationType::Paragraph => per_type.paragraph += 1,
                LocationType::Table => per_type.table += 1,
                LocationType::Footer => per_type.footer += 1,
            }
        }
        Self {
            total: locations.len(),
            distinct_keys: super::distinct_keys(locations).len(),
            per_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_location(id: DocumentId) -> PlaceholderLocation {
        PlaceholderLocation::new(
            id,
            "#date",
            Coordinates::Header {
                header_index: 0,
                paragraph_index: 2,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_token_key() {
        let err = PlaceholderLocation::new(
            DocumentId::new(),
            "name",
            Coordinates::Paragraph { paragraph_index: 0 },
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_record_only_carries_active_fields() {
        let id = DocumentId::new();
        let record = LocationRecord::from(&header_location(id));
        assert_eq!(record.location_type, LocationType::Header);
        assert_eq!(record.header_index, Some(0));
        assert_eq!(record.paragraph_index, Some(2));
        assert_eq!(record.table_index, None);
        assert_eq!(record.footer_index, None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["location_type"], "header");
        assert!(json.get("table_index").is_none());
    }

    #[test]
    fn test_record_with_stray_field_is_rejected() {
        let id = DocumentId::new();
        let mut record = LocationRecord::from(&header_location(id));
        record.row_index = Some(0);
        assert!(PlaceholderLocation::try_from(record).is_err());
    }

    #[test]
    fn test_record_roundtrip_keeps_coordinates() {
        let id = DocumentId::new();
        let loc = PlaceholderLocation::new(
            id,
            "#total",
            Coordinates::Table {
                table_index: 1,
                row_index: 3,
                column_index: 2,
            },
        )
        .unwrap();
        let back = PlaceholderLocation::try_from(LocationRecord::from(&loc)).unwrap();
        assert_eq!(back, loc);
    }

    #[test]
    fn test_statistics() {
        let id = DocumentId::new();
        let locations = vec![
            header_location(id),
            PlaceholderLocation::new(id, "#name", Coordinates::Paragraph { paragraph_index: 0 })
                .unwrap(),
            PlaceholderLocation::new(id, "#name", Coordinates::Paragraph { paragraph_index: 4 })
                .unwrap(),
        ];
        let stats = ScanStatistics::from_locations(&locations);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.distinct_keys, 2);
        assert_eq!(stats.per_type.header, 1);
        assert_eq!(stats.per_type.paragraph, 2);
        assert_eq!(stats.per_type.sum(), stats.total);
    }

    #[test]
    fn test_document_id_parse() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }
}
