//! Error types shared across the search service.

use thiserror::Error;

/// Unified error type for configuration and domain-level failures.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource name could not be parsed
    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    /// Unknown enumerated value (weight, field)
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
