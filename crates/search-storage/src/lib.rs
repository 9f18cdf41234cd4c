//! Storage layer for the registry search service.
//!
//! Provides a backend-neutral document store with:
//! - PostgreSQL (`tsvector`) and SQLite (FTS5) backends behind one [`Client`]
//! - Sessions serialized per client when the backend needs it
//! - Transactional upserts and filter-based queries over documents
//! - Ranked full-text search with highlighted excerpts

pub mod client;
pub mod documents;
pub mod error;
pub mod iterator;
pub mod key;
pub mod query;
mod schema;

pub use client::{postgres_options, Client, Concurrency, Dialect, Session};
pub use documents::{
    delete_document, delete_resource_documents, save_document, search_documents,
    update_documents, SearchHit,
};
pub use error::StorageError;
pub use iterator::DocumentIterator;
pub use key::Key;
pub use query::{Query, Requirement, Value, MAX_RESULTS};
