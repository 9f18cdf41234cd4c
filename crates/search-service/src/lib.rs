//! gRPC service implementation for registry search.
//!
//! Provides:
//! - Index RPC: fetch a spec from the registry, extract documents, store them
//! - Query RPC: ranked full-text search with highlighted excerpts
//! - Delete RPC: remove the documents derived from a resource
//! - Operations service for the operations returned by Index
//! - Health check and reflection endpoints

pub mod delete;
pub mod index;
pub mod operations;
pub mod query;
pub mod registry;
pub mod server;
pub mod service;

pub mod pb {
    pub mod google {
        pub mod api {
            tonic::include_proto!("google.api");
        }

        pub mod rpc {
            tonic::include_proto!("google.rpc");
        }

        pub mod longrunning {
            tonic::include_proto!("google.longrunning");
        }

        pub mod cloud {
            pub mod apigeeregistry {
                pub mod v1 {
                    tonic::include_proto!("google.cloud.apigeeregistry.v1");
                }
            }
        }
    }

    pub mod registry {
        pub mod search {
            pub mod v1 {
                tonic::include_proto!("registry.search.v1");
            }
        }
    }

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("search_descriptor");
}

pub use operations::{OperationStore, OperationsService};
pub use registry::{GrpcRegistry, InMemoryRegistry, Registry};
pub use server::{run_server, run_server_with_shutdown};
pub use service::SearchServiceImpl;
