//! SQLite-backed document store.
//!
//! Documents are stored as JSON text in a single `documents` table keyed by
//! `(collection, id)`. Live queries are served from the shared feed registry:
//! after every local write the collection is re-read and the full snapshot is
//! republished. Writes from other processes are not observed until the next
//! local write, but a new `watch` always starts from the table's contents.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use stockroom_core::{Document, DocumentId};

use super::live::{DocumentSnapshot, FeedRegistry, LiveQuery};
use super::r#trait::{DocumentStore, StoreError, StoredDocument};

/// Persistent document store for the client.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    feeds: FeedRegistry,
    /// Serializes write + republish so snapshots are published in write order.
    writes: Mutex<()>,
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::unavailable(err.to_string())
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `url`, e.g. `sqlite://stock.db`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true);

        // Every connection to `:memory:` is a separate database.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await.map_err(backend)?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database (tests/dev).
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                data       TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(backend)?;

        Ok(Self {
            pool,
            feeds: FeedRegistry::new(),
            writes: Mutex::new(()),
        })
    }

    async fn load(&self, collection: &str) -> Result<DocumentSnapshot, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = ?1
            ORDER BY id
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(backend)?;
            let data: String = row.try_get("data").map_err(backend)?;

            // Skip undecodable rows so one corrupt document does not hide the rest.
            let id = match DocumentId::from_str(&id) {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(collection, error = %err, "skipping row with invalid id");
                    continue;
                }
            };
            match serde_json::from_str::<Document>(&data) {
                Ok(fields) => docs.push(StoredDocument { id, fields }),
                Err(err) => {
                    tracing::warn!(collection, %id, error = %err, "skipping undecodable document");
                }
            }
        }

        Ok(Arc::new(docs))
    }

    /// Push the collection to its live queries after a committed write.
    ///
    /// The write has already persisted, so a failed re-read is logged rather
    /// than reported; the next `watch` re-seeds from the table.
    async fn republish(&self, collection: &str) {
        if !self.feeds.is_watched(collection) {
            return;
        }
        match self.load(collection).await {
            Ok(snapshot) => self.feeds.publish(collection, snapshot),
            Err(err) => {
                tracing::warn!(collection, error = %err, "write committed but snapshot refresh failed");
            }
        }
    }
}

fn encode(fields: &Document) -> Result<String, StoreError> {
    serde_json::to_string(fields).map_err(|e| StoreError::Codec(e.to_string()))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, fields: Document) -> Result<DocumentId, StoreError> {
        let data = encode(&fields)?;
        let id = DocumentId::generate();

        let _guard = self.writes.lock().await;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        self.republish(collection).await;
        tracing::debug!(collection, %id, "document created");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: String = row.try_get("data").map_err(backend)?;
        let fields = serde_json::from_str(&data).map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(Some(fields))
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Document,
    ) -> Result<(), StoreError> {
        let data = encode(&fields)?;

        let _guard = self.writes.lock().await;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = ?3
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }

        self.republish(collection).await;
        tracing::debug!(collection, %id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() > 0 {
            self.republish(collection).await;
            tracing::debug!(collection, %id, "document deleted");
        }
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<LiveQuery, StoreError> {
        // Same lock as writers: the seed snapshot cannot miss a concurrent write.
        let _guard = self.writes.lock().await;
        let current = self.load(collection).await?;
        self.feeds.subscribe(collection, current)
    }

    fn active_watches(&self, collection: &str) -> usize {
        self.feeds.active_watches(collection)
    }
}
