//! Error types for the search client.

use thiserror::Error;

/// Errors that can occur when using the search client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failed to connect to the daemon
    #[error("Connection failed: {0}")]
    Connection(#[from] tonic::transport::Error),

    /// RPC call failed
    #[error("RPC failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// Operation finished with an error
    #[error("Operation {name} failed: {message} (code {code})")]
    Operation {
        name: String,
        code: i32,
        message: String,
    },

    /// Packed operation payload could not be decoded
    #[error("Failed to decode {0}")]
    Decode(String),
}
