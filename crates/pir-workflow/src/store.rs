//! In-memory document record store
//!
//! Records are kept in insertion order. Each record sits behind its own
//! mutex: writers on one document are serialized, writers on different
//! documents never wait on each other, and readers only ever see a record
//! before or after a whole mutation.

use crate::error::WorkflowError;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use pir_model::{Document, DocumentId, ProjectId};
use std::sync::Arc;
use uuid::Uuid;

type Record = Arc<Mutex<Document>>;

/// Fields of a freshly uploaded document
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Owning project
    pub project_id: ProjectId,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Document kind
    pub doc_type: String,
    /// Size in bytes
    pub size: u64,
    /// Uploader
    pub author: String,
}

/// Authoritative table of documents, keyed by id
#[derive(Debug, Default)]
pub struct DocumentStore {
    records: RwLock<IndexMap<DocumentId, Record>>,
}

impl DocumentStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with documents
    ///
    /// # Errors
    /// Returns [`WorkflowError::DuplicateDocument`] if an id repeats
    pub fn with_documents(
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<Self, WorkflowError> {
        let store = Self::new();
        for doc in documents {
            store.insert(doc)?;
        }
        Ok(store)
    }

    /// Insert a document
    ///
    /// # Errors
    /// Returns [`WorkflowError::DuplicateDocument`] if the id is taken
    pub fn insert(&self, document: Document) -> Result<(), WorkflowError> {
        let mut records = self.records.write();
        if records.contains_key(&document.id) {
            return Err(WorkflowError::DuplicateDocument(document.id));
        }
        records.insert(document.id.clone(), Arc::new(Mutex::new(document)));
        Ok(())
    }

    /// Create a draft document with a generated id
    ///
    /// # Errors
    /// Propagates [`DocumentStore::insert`] errors
    pub fn upload(&self, new: NewDocument) -> Result<Document, WorkflowError> {
        let id = DocumentId::new(format!("doc-{}", Uuid::new_v4().simple()))?;
        let mut doc = Document::draft(id, new.project_id, new.name, new.author)
            .with_type(new.doc_type)
            .with_size(new.size);
        doc.description = new.description;

        self.insert(doc.clone())?;
        tracing::debug!(document = %doc.id, project = %doc.project_id, "document uploaded");
        Ok(doc)
    }

    /// Snapshot of one document
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.record(id).map(|r| r.lock().clone())
    }

    /// Snapshot of all documents in insertion order
    #[must_use]
    pub fn list(&self) -> Vec<Document> {
        self.records
            .read()
            .values()
            .map(|r| r.lock().clone())
            .collect()
    }

    /// Documents of one project in insertion order
    #[must_use]
    pub fn list_by_project(&self, project_id: &ProjectId) -> Vec<Document> {
        self.records
            .read()
            .values()
            .filter_map(|r| {
                let doc = r.lock();
                if &doc.project_id == project_id {
                    Some(doc.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Run `f` with exclusive access to one record
    ///
    /// Returns `None` if the id does not resolve. The store-wide index lock is
    /// released before `f` runs.
    pub fn update<R>(&self, id: &DocumentId, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        let record = self.record(id)?;
        let mut doc = record.lock();
        Some(f(&mut doc))
    }

    fn record(&self, id: &DocumentId) -> Option<Record> {
        self.records.read().get(id).cloned()
    }
}
