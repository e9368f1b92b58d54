//! Storage collaborators.
//!
//! The engine only talks to these traits. In-memory implementations back
//! the tests and embedders; filesystem implementations back the CLI.

pub mod fs;
pub mod memory;

pub use fs::{FsDocumentStore, FsLocationStore};
pub use memory::{MemoryDocumentStore, MemoryLocationStore};

use crate::domain::{DocumentId, PlaceholderLocation};
use crate::error::FillerResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocStatus {
    /// Uploaded template, eligible for scanning and filling
    Template,
    /// Generated output of a fill
    Ready,
}

/// The acting user and the organization a document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user: String,
    pub organization: String,
}

impl Principal {
    pub fn new(user: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            organization: organization.into(),
        }
    }
}

/// Metadata stored alongside document bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub original_name: String,
    pub size: u64,
    pub content_type: String,
    pub status: DocStatus,
    pub owner: Principal,
    /// Template a generated document was filled from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentId>,
    pub created_at: DateTime<Utc>,
}

impl DocumentMetadata {
    /// File extension of `original_name`, lower-cased.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.original_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Document bytes together with their metadata.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub bytes: Vec<u8>,
    pub metadata: DocumentMetadata,
}

/// Persists documents by opaque identity.
pub trait DocumentStore: Send + Sync {
    fn exists(&self, id: &DocumentId) -> FillerResult<bool>;

    /// Reads bytes and metadata; unknown ids fail with `NotFound`.
    fn read(&self, id: &DocumentId) -> FillerResult<StoredDocument>;

    /// Reads metadata only.
    fn metadata(&self, id: &DocumentId) -> FillerResult<DocumentMetadata> {
        self.read(id).map(|doc| doc.metadata)
    }

    /// Stores a new document under a fresh identity.
    fn create(&self, bytes: Vec<u8>, metadata: DocumentMetadata) -> FillerResult<DocumentId>;

    /// Removes a document; unknown ids fail with `NotFound`.
    fn remove(&self, id: &DocumentId) -> FillerResult<()>;
}

/// Persists the placeholder location set of each document.
pub trait LocationStore: Send + Sync {
    /// Atomically replaces every record of `id` with `records`.
    fn replace_all(&self, id: &DocumentId, records: Vec<PlaceholderLocation>) -> FillerResult<()>;

    /// All records of `id`, in insertion order. Empty when none are stored.
    fn query_all(&self, id: &DocumentId) -> FillerResult<Vec<PlaceholderLocation>>;

    fn remove_all(&self, id: &DocumentId) -> FillerResult<()>;
}
