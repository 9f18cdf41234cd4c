//! # search-indexer
//!
//! Turns API spec contents into searchable documents.
//!
//! ## Features
//! - Format detection from MIME type, resource name and filename
//! - Typed parse trees for Discovery, OpenAPI v2 and OpenAPI v3 (JSON or YAML)
//! - A summary document per spec, weighted highest
//! - Optional method, schema and parameter sub-documents keyed by fragment

pub mod discovery;
pub mod error;
pub mod extraction;
pub mod format;
pub mod indexer;
pub mod openapi;
pub mod tree;

pub use error::IndexerError;
pub use extraction::{Extraction, ParsedSpec};
pub use format::SpecFormat;
pub use indexer::{Indexer, IndexerConfig};
pub use tree::{Section, SpecTree};
