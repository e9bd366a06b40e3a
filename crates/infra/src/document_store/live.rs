//! Live queries: full-snapshot feeds per collection.
//!
//! Every watched collection owns a `tokio::sync::watch` channel holding its
//! latest snapshot. Publishing replaces the value, so a slow consumer skips
//! intermediate states instead of queueing them. Each live query holds one
//! receiver; dropping or cancelling it detaches from the channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use super::r#trait::{StoreError, StoredDocument};

/// Complete contents of a collection at one point in time.
pub type DocumentSnapshot = Arc<Vec<StoredDocument>>;

/// Per-collection snapshot channels shared by the store backends.
#[derive(Debug, Default)]
pub struct FeedRegistry {
    feeds: Mutex<HashMap<String, watch::Sender<DocumentSnapshot>>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new live query to `collection`.
    ///
    /// `current` must be the collection as read under the store's write
    /// ordering. It replaces whatever the channel held, so a restarted query
    /// never starts from a stale snapshot.
    pub fn subscribe(
        &self,
        collection: &str,
        current: DocumentSnapshot,
    ) -> Result<LiveQuery, StoreError> {
        let mut feeds = self
            .feeds
            .lock()
            .map_err(|_| StoreError::unavailable("feed registry lock poisoned"))?;

        let receiver = match feeds.get(collection) {
            Some(sender) => {
                sender.send_replace(current);
                sender.subscribe()
            }
            None => {
                let (sender, receiver) = watch::channel(current);
                feeds.insert(collection.to_string(), sender);
                receiver
            }
        };

        tracing::debug!(collection, "live query attached");
        Ok(LiveQuery::new(collection, receiver))
    }

    /// Replace the snapshot of `collection`; a no-op when nobody ever watched it.
    pub fn publish(&self, collection: &str, snapshot: DocumentSnapshot) {
        let Ok(feeds) = self.feeds.lock() else {
            tracing::error!(collection, "feed registry lock poisoned; snapshot dropped");
            return;
        };
        if let Some(sender) = feeds.get(collection) {
            sender.send_replace(snapshot);
        }
    }

    /// Whether `collection` has a channel that needs fresh snapshots.
    pub fn is_watched(&self, collection: &str) -> bool {
        self.feeds
            .lock()
            .map(|feeds| feeds.contains_key(collection))
            .unwrap_or(false)
    }

    pub fn active_watches(&self, collection: &str) -> usize {
        self.feeds
            .lock()
            .ok()
            .and_then(|feeds| feeds.get(collection).map(|s| s.receiver_count()))
            .unwrap_or(0)
    }
}

/// A cancellable, unbounded feed of full collection snapshots.
///
/// The first call to [`LiveQuery::next`] yields the current snapshot; later
/// calls wait for the next change. `None` means the store went away.
pub struct LiveQuery {
    collection: String,
    inner: WatchStream<DocumentSnapshot>,
}

impl core::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl LiveQuery {
    fn new(collection: &str, receiver: watch::Receiver<DocumentSnapshot>) -> Self {
        Self {
            collection: collection.to_string(),
            inner: WatchStream::new(receiver),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next snapshot.
    ///
    /// Cancel-safe: dropping the returned future does not lose a snapshot.
    pub async fn next(&mut self) -> Option<DocumentSnapshot> {
        self.inner.next().await
    }

    /// Stop the feed and release its channel receiver.
    pub fn cancel(self) {
        tracing::debug!(collection = %self.collection, "live query cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::Document;

    fn snapshot(ids: &[&str]) -> DocumentSnapshot {
        Arc::new(
            ids.iter()
                .map(|id| StoredDocument {
                    id: id.parse().unwrap(),
                    fields: Document::new(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn first_poll_yields_current_snapshot() {
        let registry = FeedRegistry::new();
        let mut query = registry.subscribe("items", snapshot(&["a"])).unwrap();
        let first = query.next().await.unwrap();
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn slow_consumer_sees_only_latest() {
        let registry = FeedRegistry::new();
        let mut query = registry.subscribe("items", snapshot(&[])).unwrap();
        assert!(query.next().await.unwrap().is_empty());

        registry.publish("items", snapshot(&["a"]));
        registry.publish("items", snapshot(&["a", "b"]));

        let latest = query.next().await.unwrap();
        assert_eq!(latest.len(), 2);
    }

    #[tokio::test]
    async fn resubscribe_starts_from_given_snapshot() {
        let registry = FeedRegistry::new();
        let first = registry.subscribe("items", snapshot(&[])).unwrap();
        first.cancel();

        // Changed behind the registry's back (e.g. by another process).
        let mut second = registry.subscribe("items", snapshot(&["a", "b"])).unwrap();
        assert_eq!(second.next().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resubscribe_refreshes_existing_queries() {
        let registry = FeedRegistry::new();
        let mut first = registry.subscribe("items", snapshot(&[])).unwrap();
        assert!(first.next().await.unwrap().is_empty());

        let _second = registry.subscribe("items", snapshot(&["a"])).unwrap();
        assert_eq!(first.next().await.unwrap().len(), 1);
    }

    #[test]
    fn cancel_releases_receiver() {
        let registry = FeedRegistry::new();
        let a = registry.subscribe("items", snapshot(&[])).unwrap();
        let b = registry.subscribe("items", snapshot(&[])).unwrap();
        assert_eq!(registry.active_watches("items"), 2);

        a.cancel();
        assert_eq!(registry.active_watches("items"), 1);
        drop(b);
        assert_eq!(registry.active_watches("items"), 0);
        assert!(registry.is_watched("items"));
    }

    #[test]
    fn publish_to_unwatched_collection_is_noop() {
        let registry = FeedRegistry::new();
        registry.publish("nobody", snapshot(&["a"]));
        assert!(!registry.is_watched("nobody"));
        assert_eq!(registry.active_watches("nobody"), 0);
    }
}
