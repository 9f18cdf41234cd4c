//! # search-types
//!
//! Shared domain types for the registry search service:
//! - [`Document`]: one indexed, searchable text record
//! - [`ApiSpec`] / [`SpecName`]: spec metadata and resource names
//! - [`Settings`]: layered configuration

pub mod config;
pub mod document;
pub mod error;
pub mod spec;

pub use config::{DatabaseSettings, IndexerSettings, RegistrySettings, Settings, SUPPORTED_DRIVERS};
pub use document::{escape_html, Document, Field, TsVector, Weight, DOCUMENT_ENTITY, SPEC_KIND};
pub use error::SearchError;
pub use spec::{ApiSpec, SpecName};
