//! Placeholder discovery.

use crate::document::{Docx, Paragraph};
use crate::domain::{Coordinates, DocumentId, PlaceholderLocation, PlaceholderMatcher};
use crate::error::FillerResult;

/// Walks a document and records every placeholder occurrence.
///
/// Emission order is headers, body paragraphs, tables, then footers; within
/// each section indices ascend. A paragraph with the same token twice
/// produces two records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    matcher: PlaceholderMatcher,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&self, docx: &Docx, id: DocumentId) -> FillerResult<Vec<PlaceholderLocation>> {
        let mut found = Vec::new();

        for (header_index, paragraphs) in docx.headers().iter().enumerate() {
            for (paragraph_index, paragraph) in paragraphs.iter().enumerate() {
                self.collect(
                    &mut found,
                    id,
                    paragraph,
                    Coordinates::Header {
                        header_index,
                        paragraph_index,
                    },
                )?;
            }
        }

        for (paragraph_index, paragraph) in docx.body_paragraphs().iter().enumerate() {
            self.collect(
                &mut found,
                id,
                paragraph,
                Coordinates::Paragraph { paragraph_index },
            )?;
        }

        for (table_index, rows) in docx.tables().iter().enumerate() {
            for (row_index, cells) in rows.iter().enumerate() {
                for (column_index, paragraphs) in cells.iter().enumerate() {
                    let coordinates = Coordinates::Table {
                        table_index,
                        row_index,
                        column_index,
                    };
                    for paragraph in paragraphs {
                        self.collect(&mut found, id, paragraph, coordinates)?;
                    }
                }
            }
        }

        for (footer_index, paragraphs) in docx.footers().iter().enumerate() {
            for (paragraph_index, paragraph) in paragraphs.iter().enumerate() {
                self.collect(
                    &mut found,
                    id,
                    paragraph,
                    Coordinates::Footer {
                        footer_index,
                        paragraph_index,
                    },
                )?;
            }
        }

        Ok(found)
    }

    fn collect(
        &self,
        found: &mut Vec<PlaceholderLocation>,
        id: DocumentId,
        paragraph: &Paragraph<'_>,
        coordinates: Coordinates,
    ) -> FillerResult<()> {
        let text = paragraph.text();
        for token in self.matcher.extract_all(&text) {
            found.push(PlaceholderLocation::new(id, token, coordinates)?);
        }
        Ok(())
    }
}
