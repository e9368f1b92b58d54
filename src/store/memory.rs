//! In-memory stores.

use super::{DocumentMetadata, DocumentStore, LocationStore, StoredDocument};
use crate::domain::{DocumentId, PlaceholderLocation};
use crate::error::{FillerError, FillerResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Document store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, StoredDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document under a caller-chosen identity.
    pub fn insert(&self, id: DocumentId, bytes: Vec<u8>, metadata: DocumentMetadata) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, StoredDocument { bytes, metadata });
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn exists(&self, id: &DocumentId) -> FillerResult<bool> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id))
    }

    fn read(&self, id: &DocumentId) -> FillerResult<StoredDocument> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| FillerError::not_found(id))
    }

    fn create(&self, bytes: Vec<u8>, metadata: DocumentMetadata) -> FillerResult<DocumentId> {
        let id = DocumentId::new();
        self.insert(id, bytes, metadata);
        Ok(id)
    }

    fn remove(&self, id: &DocumentId) -> FillerResult<()> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| FillerError::not_found(id))
    }
}

/// Location store backed by a map; a replace happens under one write lock.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    records: RwLock<HashMap<DocumentId, Vec<PlaceholderLocation>>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationStore for MemoryLocationStore {
    fn replace_all(&self, id: &DocumentId, records: Vec<PlaceholderLocation>) -> FillerResult<()> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.is_empty() {
            map.remove(id);
        } else {
            map.insert(*id, records);
        }
        Ok(())
    }

    fn query_all(&self, id: &DocumentId) -> FillerResult<Vec<PlaceholderLocation>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    fn remove_all(&self, id: &DocumentId) -> FillerResult<()> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }
}
