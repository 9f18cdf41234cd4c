//! Client library for the registry search daemon.
//!
//! # Example
//!
//! ```rust,no_run
//! use search_client::SearchClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = SearchClient::connect("http://127.0.0.1:50061").await?;
//!
//!     let outcome = client
//!         .index("projects/demo/locations/global/apis/petstore/versions/v1/specs/openapi")
//!         .await?;
//!     println!("{}: {}", outcome.operation_name, outcome.message);
//!
//!     for result in client.query("pets").await? {
//!         println!("{}  {}", result.key, result.excerpt);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;

pub use client::{decode_index_outcome, IndexOutcome, QueryResult, SearchClient, DEFAULT_ENDPOINT};
pub use error::ClientError;
