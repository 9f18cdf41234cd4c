//! Indexer error types.

use thiserror::Error;

use search_types::SearchError;

use crate::format::SpecFormat;

/// Errors that can occur while turning spec contents into documents.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Spec resource name could not be parsed
    #[error(transparent)]
    InvalidName(#[from] SearchError),

    /// JSON contents did not parse as the detected format
    #[error("Failed to parse {format} document: {source}")]
    Json {
        format: SpecFormat,
        source: serde_json::Error,
    },

    /// YAML contents did not parse as the detected format
    #[error("Failed to parse {format} document: {source}")]
    Yaml {
        format: SpecFormat,
        source: serde_yml::Error,
    },
}

impl IndexerError {
    /// True when the failure came from the spec contents rather than its name.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, IndexerError::Json { .. } | IndexerError::Yaml { .. })
    }
}
