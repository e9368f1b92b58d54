//! Template scanning, querying and filling.
//!
//! [`TemplateService`] coordinates the document store, the location store,
//! the optional format converter and the value formatter. Each operation is
//! synchronous and either completes or persists nothing.

pub mod fill;
pub mod locks;
pub mod scanner;

pub use fill::FillReport;
pub use locks::ScanLocks;
pub use scanner::Scanner;

use crate::convert::{FormatConverter, OutputFormat};
use crate::document::Docx;
use crate::domain::{self, DocumentId, PlaceholderLocation, ScanStatistics, ValueFormatter};
use crate::error::{FillerError, FillerResult};
use crate::store::{
    DocStatus, DocumentMetadata, DocumentStore, LocationStore, MemoryDocumentStore,
    MemoryLocationStore, Principal, StoredDocument,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Longest accepted output file name, in characters.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Result of storing and scanning a new template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub id: DocumentId,
    pub placeholder_count: usize,
}

/// A request to fill a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRequest {
    pub document_id: DocumentId,
    pub file_name: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    pub values: BTreeMap<String, String>,
}

impl FillRequest {
    pub fn new(document_id: DocumentId, file_name: impl Into<String>) -> Self {
        Self {
            document_id,
            file_name: file_name.into(),
            output_format: OutputFormat::default(),
            values: BTreeMap::new(),
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    fn check_file_name(&self) -> FillerResult<()> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(FillerError::invalid_input(
                "file_name",
                "file name must not be blank",
            ));
        }
        if name.chars().count() > MAX_FILE_NAME_LEN {
            return Err(FillerError::invalid_input(
                "file_name",
                format!("file name exceeds {} characters", MAX_FILE_NAME_LEN),
            ));
        }
        if name.contains(['/', '\\']) {
            return Err(FillerError::invalid_input(
                "file_name",
                "file name must not contain path separators",
            ));
        }
        Ok(())
    }
}

/// A persisted fill output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilledDocument {
    pub id: DocumentId,
    pub metadata: DocumentMetadata,
    pub report: FillReport,
}

/// Service for the template lifecycle.
pub struct TemplateService {
    documents: Arc<dyn DocumentStore>,
    locations: Arc<dyn LocationStore>,
    converter: Option<Arc<dyn FormatConverter>>,
    formatter: ValueFormatter,
    scanner: Scanner,
    locks: ScanLocks,
}

impl TemplateService {
    /// Creates a service over the given stores, with no converter.
    pub fn new(documents: Arc<dyn DocumentStore>, locations: Arc<dyn LocationStore>) -> Self {
        Self {
            documents,
            locations,
            converter: None,
            formatter: ValueFormatter::default(),
            scanner: Scanner::new(),
            locks: ScanLocks::new(),
        }
    }

    /// Creates a service over fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryLocationStore::new()),
        )
    }

    pub fn with_converter(mut self, converter: Arc<dyn FormatConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_formatter(mut self, formatter: ValueFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn formatter(&self) -> &ValueFormatter {
        &self.formatter
    }

    /// Stores `bytes` as a new template and scans it.
    ///
    /// Bytes that do not parse are rejected before anything is stored.
    pub fn upload(
        &self,
        bytes: Vec<u8>,
        name: &str,
        content_type: &str,
        principal: &Principal,
    ) -> FillerResult<UploadResult> {
        if bytes.is_empty() {
            return Err(FillerError::invalid_input("file", "file is empty"));
        }
        if name.trim().is_empty() {
            return Err(FillerError::invalid_input("name", "file name must not be blank"));
        }
        let docx = Docx::from_bytes(&bytes)?;

        let metadata = DocumentMetadata {
            original_name: name.trim().to_string(),
            size: bytes.len() as u64,
            content_type: match content_type.trim() {
                "" => OutputFormat::Docx.content_type().to_string(),
                other => other.to_string(),
            },
            status: DocStatus::Template,
            owner: principal.clone(),
            source: None,
            created_at: chrono::Utc::now(),
        };
        let id = self.documents.create(bytes, metadata)?;
        let placeholder_count = self.locks.with(&id, || self.replace_locations(&docx, id))?;

        tracing::info!(%id, file = name, placeholders = placeholder_count, "uploaded template");
        Ok(UploadResult {
            id,
            placeholder_count,
        })
    }

    /// Rescans a template, replacing its stored location set. Returns the
    /// number of locations written.
    pub fn scan(&self, id: &DocumentId) -> FillerResult<usize> {
        self.locks.with(id, || {
            let stored = self.documents.read(id)?;
            if stored.metadata.status != DocStatus::Template {
                return Err(FillerError::NotTemplate { id: id.to_string() });
            }
            let docx = Docx::from_bytes(&stored.bytes)?;
            self.replace_locations(&docx, *id)
        })
    }

    fn replace_locations(&self, docx: &Docx, id: DocumentId) -> FillerResult<usize> {
        let found = self.scanner.scan(docx, id)?;
        let count = found.len();
        self.locations.replace_all(&id, found)?;
        tracing::info!(%id, locations = count, "scanned document");
        Ok(count)
    }

    /// Sorted distinct keys of a document, scanning it first when no
    /// locations are stored yet.
    pub fn list_keys(&self, id: &DocumentId) -> FillerResult<Vec<String>> {
        let metadata = self.documents.metadata(id)?;
        let mut locations = self.locations.query_all(id)?;
        if locations.is_empty() && metadata.status == DocStatus::Template {
            tracing::debug!(%id, "no stored locations, scanning");
            self.scan(id)?;
            locations = self.locations.query_all(id)?;
        }
        Ok(domain::distinct_keys(&locations).into_iter().collect())
    }

    /// Stored locations of a document, verbatim.
    pub fn list_locations(&self, id: &DocumentId) -> FillerResult<Vec<PlaceholderLocation>> {
        self.ensure_exists(id)?;
        self.locations.query_all(id)
    }

    /// Statistics over the stored location set. Never scans.
    pub fn stats(&self, id: &DocumentId) -> FillerResult<ScanStatistics> {
        self.ensure_exists(id)?;
        let locations = self.locations.query_all(id)?;
        Ok(ScanStatistics::from_locations(&locations))
    }

    /// Bytes and metadata of any stored document.
    pub fn read(&self, id: &DocumentId) -> FillerResult<StoredDocument> {
        self.documents.read(id)
    }

    /// Fills a template and stores the result as a new READY document.
    pub fn fill(
        &self,
        request: &FillRequest,
        principal: &Principal,
    ) -> FillerResult<FilledDocument> {
        request.check_file_name()?;
        let id = &request.document_id;

        let stored = self.documents.read(id)?;
        if stored.metadata.status != DocStatus::Template {
            return Err(FillerError::NotTemplate { id: id.to_string() });
        }

        let locations = self.locations.query_all(id)?;
        if locations.is_empty() {
            return Err(FillerError::NoLocations { id: id.to_string() });
        }
        domain::validate(&domain::distinct_keys(&locations), &request.values)?;

        let mut docx = Docx::from_bytes(&stored.bytes)?;
        let report = fill::apply(&mut docx, &locations, &request.values, &self.formatter);
        let filled = docx.to_bytes()?;

        let format = request.output_format;
        let bytes = match format {
            OutputFormat::Docx => filled,
            other => self.convert(&filled, other)?,
        };

        let metadata = DocumentMetadata {
            original_name: format.file_name(&request.file_name),
            size: bytes.len() as u64,
            content_type: format.content_type().to_string(),
            status: DocStatus::Ready,
            owner: principal.clone(),
            source: Some(*id),
            created_at: chrono::Utc::now(),
        };
        let new_id = self.documents.create(bytes, metadata.clone())?;

        tracing::info!(
            template = %id,
            output = %new_id,
            format = %format,
            substituted = report.substituted,
            skipped = report.skipped,
            "filled template"
        );
        Ok(FilledDocument {
            id: new_id,
            metadata,
            report,
        })
    }

    fn convert(&self, bytes: &[u8], to: OutputFormat) -> FillerResult<Vec<u8>> {
        let converter = self.converter.as_ref().ok_or_else(|| {
            tracing::warn!(format = %to, "no converter configured");
            FillerError::ConversionFailed {
                reason: format!("no converter configured for {}", to),
            }
        })?;
        converter.convert(bytes, OutputFormat::Docx, to)
    }

    /// Removes a document together with its stored locations.
    ///
    /// Locations go first so that a failure never leaves records behind for
    /// a document that no longer exists.
    pub fn remove(&self, id: &DocumentId) -> FillerResult<()> {
        self.locks.with(id, || {
            self.ensure_exists(id)?;
            self.locations.remove_all(id)?;
            self.documents.remove(id)
        })?;
        tracing::info!(%id, "removed document");
        Ok(())
    }

    fn ensure_exists(&self, id: &DocumentId) -> FillerResult<()> {
        if self.documents.exists(id)? {
            Ok(())
        } else {
            Err(FillerError::not_found(id))
        }
    }
}
