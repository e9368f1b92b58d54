//! Filesystem-backed stores.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<organization>/<yyyy>/<mm>/<dd>/<id>.<ext>   document bytes
//! <root>/meta/<id>.json                              document metadata
//! <root>/locations/<id>.json                         placeholder locations
//! ```
//!
//! Every JSON file is written to a temporary sibling and renamed into place,
//! so readers observe either the previous or the new content.

use super::{DocumentMetadata, DocumentStore, LocationStore, StoredDocument};
use crate::domain::{DocumentId, LocationRecord, PlaceholderLocation};
use crate::error::{FillerError, FillerResult};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn storage_err(path: &Path) -> impl FnOnce(std::io::Error) -> FillerError + '_ {
    move |source| FillerError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `data` to `path` through a temporary file in the same directory.
fn write_atomic(path: &Path, data: &[u8]) -> FillerResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(storage_err(dir))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err(dir))?;
    tmp.write_all(data).map_err(storage_err(path))?;
    tmp.as_file().sync_all().map_err(storage_err(path))?;
    tmp.persist(path).map_err(|e| FillerError::Storage {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Directory name for an organization: spaces become underscores and path
/// separators are dropped.
fn organization_dir(organization: &str) -> String {
    let cleaned: String = organization
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MetaEntry {
    /// Blob path relative to the storage root
    path: PathBuf,
    metadata: DocumentMetadata,
}

/// Document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn meta_path(&self, id: &DocumentId) -> PathBuf {
        self.root.join("meta").join(format!("{}.json", id))
    }

    fn read_meta(&self, id: &DocumentId) -> FillerResult<MetaEntry> {
        let path = self.meta_path(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FillerError::not_found(id))
            }
            Err(e) => return Err(storage_err(&path)(e)),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn blob_path(&self, id: &DocumentId, metadata: &DocumentMetadata) -> PathBuf {
        let date = metadata.created_at.date_naive();
        let ext = metadata.extension().unwrap_or_else(|| "bin".to_string());
        PathBuf::from(organization_dir(&metadata.owner.organization))
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
            .join(format!("{}.{}", id, ext))
    }
}

impl DocumentStore for FsDocumentStore {
    fn exists(&self, id: &DocumentId) -> FillerResult<bool> {
        Ok(self.meta_path(id).is_file())
    }

    fn read(&self, id: &DocumentId) -> FillerResult<StoredDocument> {
        let entry = self.read_meta(id)?;
        let path = self.root.join(&entry.path);
        let bytes = fs::read(&path).map_err(|e| {
            FillerError::read_failure(format!("cannot read '{}'", path.display()), e)
        })?;
        Ok(StoredDocument {
            bytes,
            metadata: entry.metadata,
        })
    }

    fn metadata(&self, id: &DocumentId) -> FillerResult<DocumentMetadata> {
        self.read_meta(id).map(|entry| entry.metadata)
    }

    fn create(&self, bytes: Vec<u8>, metadata: DocumentMetadata) -> FillerResult<DocumentId> {
        let id = DocumentId::new();
        let relative = self.blob_path(&id, &metadata);
        let blob = self.root.join(&relative);
        write_atomic(&blob, &bytes)?;

        let entry = MetaEntry {
            path: relative,
            metadata,
        };
        let written = serde_json::to_vec_pretty(&entry)
            .map_err(FillerError::from)
            .and_then(|json| write_atomic(&self.meta_path(&id), &json));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&blob) {
                tracing::warn!(path = %blob.display(), error = %cleanup, "cannot remove orphaned blob");
            }
            return Err(e);
        }
        tracing::debug!(%id, path = %entry.path.display(), "stored document");
        Ok(id)
    }

    fn remove(&self, id: &DocumentId) -> FillerResult<()> {
        let entry = self.read_meta(id)?;
        let meta_path = self.meta_path(id);
        fs::remove_file(&meta_path).map_err(storage_err(&meta_path))?;

        let blob = self.root.join(&entry.path);
        if let Err(e) = fs::remove_file(&blob) {
            tracing::warn!(path = %blob.display(), error = %e, "document blob already gone");
        }
        Ok(())
    }
}

/// Location store keeping one JSON file per document.
#[derive(Debug, Clone)]
pub struct FsLocationStore {
    root: PathBuf,
}

impl FsLocationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, id: &DocumentId) -> PathBuf {
        self.root.join("locations").join(format!("{}.json", id))
    }
}

impl LocationStore for FsLocationStore {
    fn replace_all(&self, id: &DocumentId, records: Vec<PlaceholderLocation>) -> FillerResult<()> {
        let path = self.path(id);
        if records.is_empty() {
            return self.remove_all(id);
        }
        let flat: Vec<LocationRecord> = records.iter().map(LocationRecord::from).collect();
        write_atomic(&path, &serde_json::to_vec_pretty(&flat)?)
    }

    fn query_all(&self, id: &DocumentId) -> FillerResult<Vec<PlaceholderLocation>> {
        let path = self.path(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_err(&path)(e)),
        };
        let flat: Vec<LocationRecord> = serde_json::from_slice(&data)?;
        flat.into_iter().map(PlaceholderLocation::try_from).collect()
    }

    fn remove_all(&self, id: &DocumentId) -> FillerResult<()> {
        let path = self.path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(&path)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;
    use crate::store::{DocStatus, Principal};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            original_name: "contract.docx".to_string(),
            size: 4,
            content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                .to_string(),
            status: DocStatus::Template,
            owner: Principal::new("ali", "Acme Corp"),
            source: None,
            created_at: chrono::Utc.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_organization_dir() {
        assert_eq!(organization_dir("Acme Corp"), "Acme_Corp");
        assert_eq!(organization_dir("../etc"), "..etc");
        assert_eq!(organization_dir(".."), "_");
    }

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let id = store.create(b"data".to_vec(), metadata()).unwrap();

        let blob = dir
            .path()
            .join("Acme_Corp/2024/03/07")
            .join(format!("{}.docx", id));
        assert!(blob.is_file());
        assert!(store.exists(&id).unwrap());

        let doc = store.read(&id).unwrap();
        assert_eq!(doc.bytes, b"data");
        assert_eq!(doc.metadata, metadata());

        store.remove(&id).unwrap();
        assert!(!blob.exists());
        assert_eq!(store.read(&id).unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_failed_metadata_write_removes_blob() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meta"), b"not a directory").unwrap();
        let store = FsDocumentStore::new(dir.path());

        assert!(store.create(b"data".to_vec(), metadata()).is_err());
        let day = dir.path().join("Acme_Corp/2024/03/07");
        assert_eq!(fs::read_dir(&day).unwrap().count(), 0);
    }

    #[test]
    fn test_locations_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsLocationStore::new(dir.path());
        let id = DocumentId::new();
        let records = vec![
            PlaceholderLocation::new(
                id,
                "#date",
                Coordinates::Footer {
                    footer_index: 0,
                    paragraph_index: 1,
                },
            )
            .unwrap(),
            PlaceholderLocation::new(
                id,
                "#sum",
                Coordinates::Table {
                    table_index: 0,
                    row_index: 2,
                    column_index: 1,
                },
            )
            .unwrap(),
        ];

        assert!(store.query_all(&id).unwrap().is_empty());
        store.replace_all(&id, records.clone()).unwrap();
        assert_eq!(store.query_all(&id).unwrap(), records);

        store.remove_all(&id).unwrap();
        assert!(store.query_all(&id).unwrap().is_empty());
    }
}
