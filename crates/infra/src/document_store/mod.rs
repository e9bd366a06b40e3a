//! Document store boundary.
//!
//! This module defines an infrastructure-facing abstraction over a collection
//! of schemaless documents with live queries, plus the backends the client can
//! run against.

pub mod in_memory;
pub mod live;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use live::{DocumentSnapshot, FeedRegistry, LiveQuery};
pub use sqlite::SqliteDocumentStore;
pub use r#trait::{DocumentStore, StoreError, StoredDocument};
