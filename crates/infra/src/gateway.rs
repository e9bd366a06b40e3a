//! Inventory gateway: the single point of access to the inventory collection.
//!
//! The gateway turns records into documents and back, validates records before
//! they reach the store, and decodes live snapshots while isolating documents
//! that do not have the shape of a record.

use thiserror::Error;

use stockroom_core::{DocumentId, DomainError};
use stockroom_inventory::{InventoryRecord, MalformedRecord};

use crate::document_store::{DocumentStore, LiveQuery, StoreError, StoredDocument};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "inventory";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Malformed(#[from] MalformedRecord),
}

/// Result of [`InventoryGateway::update`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The document was overwritten.
    Applied,
    /// The record had no identifier; nothing was sent to the store.
    SkippedMissingId,
}

/// One decoded live snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSnapshot {
    pub records: Vec<InventoryRecord>,
    /// Documents that could not be decoded; excluded from `records`.
    pub rejected: Vec<MalformedRecord>,
}

impl RecordSnapshot {
    /// Decode every document, keeping failures apart from the good records.
    pub fn decode(docs: &[StoredDocument]) -> Self {
        let mut snapshot = RecordSnapshot::default();
        for doc in docs {
            match InventoryRecord::from_document(doc.id.clone(), &doc.fields) {
                Ok(record) => snapshot.records.push(record),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed inventory document");
                    snapshot.rejected.push(err);
                }
            }
        }
        snapshot
    }
}

/// Live feed of decoded inventory snapshots.
///
/// Cancel it (or drop it) when the view that owns it closes; this releases the
/// store-side watch.
#[derive(Debug)]
pub struct RecordFeed {
    query: LiveQuery,
}

impl RecordFeed {
    /// Wait for the next snapshot; `None` once the store closes the feed.
    pub async fn next(&mut self) -> Option<RecordSnapshot> {
        let docs = self.query.next().await?;
        let snapshot = RecordSnapshot::decode(&docs);
        tracing::debug!(
            collection = self.query.collection(),
            records = snapshot.records.len(),
            rejected = snapshot.rejected.len(),
            "inventory snapshot"
        );
        Some(snapshot)
    }

    pub fn cancel(self) {
        self.query.cancel();
    }
}

/// CRUD + live query over one inventory collection.
///
/// The store is injected; wrap it in an `Arc` to share it between gateways.
#[derive(Debug)]
pub struct InventoryGateway<S> {
    store: S,
    collection: String,
}

impl<S> InventoryGateway<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a new record and return the identifier the store assigned.
    ///
    /// The record must not have an identifier yet.
    pub async fn create(&self, record: &InventoryRecord) -> Result<DocumentId, GatewayError> {
        if let Some(id) = &record.id {
            return Err(DomainError::invariant(format!(
                "record already persisted as {id}; use update"
            ))
            .into());
        }
        record.validate()?;

        let id = self
            .store
            .create(&self.collection, record.to_document())
            .await?;
        tracing::info!(collection = %self.collection, %id, name = %record.name, "inventory record created");
        Ok(id)
    }

    /// Overwrite every field of an existing record.
    ///
    /// A record without an identifier is skipped rather than rejected: the
    /// store is not contacted and [`UpdateOutcome::SkippedMissingId`] is
    /// returned.
    pub async fn update(&self, record: &InventoryRecord) -> Result<UpdateOutcome, GatewayError> {
        let Some(id) = &record.id else {
            tracing::warn!(collection = %self.collection, name = %record.name, "update skipped: record has no id");
            return Ok(UpdateOutcome::SkippedMissingId);
        };
        record.validate()?;

        self.store
            .update(&self.collection, id, record.to_document())
            .await?;
        tracing::info!(collection = %self.collection, %id, "inventory record updated");
        Ok(UpdateOutcome::Applied)
    }

    /// Remove a record. Deleting an unknown id succeeds.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), GatewayError> {
        self.store.delete(&self.collection, id).await?;
        tracing::info!(collection = %self.collection, %id, "inventory record deleted");
        Ok(())
    }

    /// One-shot read of a single record.
    pub async fn get(&self, id: &DocumentId) -> Result<Option<InventoryRecord>, GatewayError> {
        let Some(doc) = self.store.get(&self.collection, id).await? else {
            return Ok(None);
        };
        Ok(Some(InventoryRecord::from_document(id.clone(), &doc)?))
    }

    /// Start a live feed of the whole collection.
    pub async fn subscribe(&self) -> Result<RecordFeed, GatewayError> {
        let query = self.store.watch(&self.collection).await?;
        Ok(RecordFeed { query })
    }

    /// Live feeds currently attached to this collection.
    pub fn active_subscriptions(&self) -> usize {
        self.store.active_watches(&self.collection)
    }
}
