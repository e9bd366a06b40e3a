//! Infrastructure layer: document store backends and the inventory gateway.

pub mod document_store;
pub mod gateway;

pub use document_store::{
    DocumentSnapshot, DocumentStore, InMemoryDocumentStore, LiveQuery, SqliteDocumentStore,
    StoreError, StoredDocument,
};
pub use gateway::{
    DEFAULT_COLLECTION, GatewayError, InventoryGateway, RecordFeed, RecordSnapshot, UpdateOutcome,
};
