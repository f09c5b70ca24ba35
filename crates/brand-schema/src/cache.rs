//! # Schema Cache
//!
//! Memoizes parsed schema documents by normalized path so that a document
//! referenced from several places is read and parsed once per session.
//!
//! A cache is an explicit object. [`SchemaValidator`](crate::SchemaValidator)
//! creates a fresh one per `validate_file` call unless the caller opts into
//! sharing, in which case documents stay cached until
//! [`SchemaCache::clear`] is called, even if the files change on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::document::{normalize_path, SchemaDocument, SharedDocument};
use crate::error::SchemaError;

/// Session-scoped store of loaded schema documents.
#[derive(Debug, Default)]
pub struct SchemaCache {
    documents: RwLock<HashMap<PathBuf, SharedDocument>>,
}

impl SchemaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the document at `path`, loading it on first request.
    ///
    /// `referenced_from` names the reference that asked for the document and
    /// is carried into the error if the load fails.
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        referenced_from: Option<&str>,
    ) -> Result<SharedDocument, SchemaError> {
        let path = normalize_path(path.as_ref());

        if let Some(doc) = self.documents.read().get(&path) {
            tracing::trace!(path = %path.display(), "schema cache hit");
            return Ok(Arc::clone(doc));
        }

        let doc = Arc::new(SchemaDocument::load(&path, referenced_from)?);

        // Another holder may have loaded the same path meanwhile; keep the
        // first so every caller sees one instance per path.
        let mut documents = self.documents.write();
        let entry = documents.entry(path).or_insert(doc);
        Ok(Arc::clone(entry))
    }

    /// Register an already-parsed document under its own identity.
    ///
    /// An existing entry for the same path wins and is returned.
    pub fn insert(&self, document: SchemaDocument) -> SharedDocument {
        let mut documents = self.documents.write();
        let entry = documents
            .entry(document.path().to_path_buf())
            .or_insert_with(|| Arc::new(document));
        Arc::clone(entry)
    }

    /// True if a document for `path` has been loaded.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.documents.read().contains_key(&normalize_path(path.as_ref()))
    }

    /// Number of distinct documents loaded.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Drop every cached document.
    pub fn clear(&self) {
        self.documents.write().clear();
    }
}
