//! `stockroom-core`: shared building blocks.
//!
//! This crate contains **pure** primitives (no IO): the error model, document
//! identifiers and the wire representation exchanged with a document store.

pub mod document;
pub mod error;
pub mod id;

pub use document::{Document, FieldValue};
pub use error::{DomainError, DomainResult};
pub use id::DocumentId;
