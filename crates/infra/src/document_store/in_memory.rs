use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stockroom_core::{Document, DocumentId};

use super::live::{DocumentSnapshot, FeedRegistry, LiveQuery};
use super::r#trait::{DocumentStore, StoreError, StoredDocument};

type Collection = BTreeMap<DocumentId, Document>;

/// In-memory document store.
///
/// Intended for tests/dev. Writes to a collection are serialized under one
/// lock and the new snapshot is published before the lock is released, so
/// live queries never observe snapshots out of order.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    feeds: FeedRegistry,
    offline: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the connection to the backend.
    ///
    /// While offline every operation fails with [`StoreError::Unavailable`].
    /// Live queries already attached stay attached.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store is offline"));
        }
        Ok(())
    }

    fn snapshot_of(collection: Option<&Collection>) -> DocumentSnapshot {
        let docs = collection
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| StoredDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Arc::new(docs)
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, fields: Document) -> Result<DocumentId, StoreError> {
        self.ensure_online()?;

        let id = DocumentId::generate();
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let docs = collections.entry(collection.to_string()).or_default();
        docs.insert(id.clone(), fields);
        self.feeds.publish(collection, Self::snapshot_of(Some(docs)));

        tracing::debug!(collection, %id, "document created");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        self.ensure_online()?;

        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;

        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let slot = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        *slot = fields;
        self.feeds.publish(collection, Self::snapshot_of(Some(docs)));

        tracing::debug!(collection, %id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.ensure_online()?;

        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(());
        };
        if docs.remove(id).is_some() {
            self.feeds.publish(collection, Self::snapshot_of(Some(docs)));
            tracing::debug!(collection, %id, "document deleted");
        }
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        self.ensure_online()?;

        // Hold the read lock while attaching so no write slips in between the
        // seed snapshot and the subscription.
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let current = Self::snapshot_of(collections.get(collection));
        self.feeds.subscribe(collection, current)
    }

    fn active_watches(&self, collection: &str) -> usize {
        self.feeds.active_watches(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::FieldValue;

    fn doc(name: &str) -> Document {
        let mut d = Document::new();
        d.insert("name".to_string(), FieldValue::from(name));
        d
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let store = InMemoryDocumentStore::new();
        let a = store.create("items", doc("a")).await.unwrap();
        let b = store.create("items", doc("b")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len("items"), 2);
        assert_eq!(store.get("items", &a).await.unwrap(), Some(doc("a")));
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("items", doc("a")).await.unwrap();
        assert_eq!(store.get("other", &id).await.unwrap(), None);
        assert_eq!(store.len("other"), 0);
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("items", doc("a")).await.unwrap();

        let mut replacement = Document::new();
        replacement.insert("other".to_string(), FieldValue::Integer(1));
        store.update("items", &id, replacement.clone()).await.unwrap();

        assert_eq!(store.get("items", &id).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn update_of_unknown_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let id: DocumentId = "missing".parse().unwrap();
        let err = store.update("items", &id, doc("x")).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("items", &id));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("items", doc("a")).await.unwrap();
        store.delete("items", &id).await.unwrap();
        store.delete("items", &id).await.unwrap();
        store.delete("never-created", &id).await.unwrap();
        assert_eq!(store.len("items"), 0);
    }

    #[tokio::test]
    async fn watch_emits_full_snapshots_after_each_write() {
        let store = InMemoryDocumentStore::new();
        store.create("items", doc("a")).await.unwrap();

        let mut query = store.watch("items").await.unwrap();
        assert_eq!(query.next().await.unwrap().len(), 1);

        let b = store.create("items", doc("b")).await.unwrap();
        assert_eq!(query.next().await.unwrap().len(), 2);

        store.delete("items", &b).await.unwrap();
        let snap = query.next().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].fields, doc("a"));
    }

    #[tokio::test]
    async fn offline_store_rejects_operations() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("items", doc("a")).await.unwrap();

        store.set_offline(true);
        assert!(matches!(
            store.create("items", doc("b")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.get("items", &id).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.delete("items", &id).await, Err(StoreError::Unavailable(_))));
        assert!(store.watch("items").await.is_err());

        store.set_offline(false);
        assert!(store.get("items", &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cancelled_watch_is_released() {
        let store = InMemoryDocumentStore::new();
        let query = store.watch("items").await.unwrap();
        assert_eq!(store.active_watches("items"), 1);
        query.cancel();
        assert_eq!(store.active_watches("items"), 0);
    }
}
