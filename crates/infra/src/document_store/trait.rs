use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{Document, DocumentId};

use super::live::LiveQuery;

/// A document as returned by a live query: its identifier plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub fields: Document,
}

/// Document store operation error.
///
/// These are **infrastructure errors** (connectivity, missing documents,
/// encoding) as opposed to domain errors (validation, invariants). They are
/// propagated to the caller uninterpreted; no retry happens at this layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: DocumentId },

    #[error("document encoding failed: {0}")]
    Codec(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found(collection: &str, id: &DocumentId) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.clone(),
        }
    }
}

/// Named collections of schemaless documents with live queries.
///
/// ## Semantics
///
/// - Identifiers are opaque strings assigned by the store on `create`.
/// - Writes are atomic per document; concurrent writes to one document are
///   last-writer-wins.
/// - `delete` is idempotent: removing an unknown id succeeds.
/// - `watch` yields the full current contents of a collection first, then a new
///   full snapshot after every change. Slow consumers only see the latest one.
/// - A write that committed reports success even if refreshing live queries
///   afterwards fails.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return its assigned identifier.
    async fn create(&self, collection: &str, fields: Document) -> Result<DocumentId, StoreError>;

    /// Read one document.
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Replace every field of an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError>;

    /// Remove a document if present.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;

    /// Start a live query over the whole collection.
    async fn watch(&self, collection: &str) -> Result<LiveQuery, StoreError>;

    /// Number of live queries currently attached to `collection`.
    fn active_watches(&self, collection: &str) -> usize;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn create(&self, collection: &str, fields: Document) -> Result<DocumentId, StoreError> {
        (**self).create(collection, fields).await
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError> {
        (**self).update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }

    async fn watch(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        (**self).watch(collection).await
    }

    fn active_watches(&self, collection: &str) -> usize {
        (**self).active_watches(collection)
    }
}
