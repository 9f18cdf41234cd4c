//! Index RPC implementation.
//!
//! Handles indexing by:
//! 1. Opening a storage session
//! 2. Fetching spec metadata and contents from the registry
//! 3. Extracting documents from the contents
//! 4. Writing (or deleting) each document
//! 5. Recording a completed operation

use tonic::{Request, Response, Status};
use tracing::{info, warn};

use search_indexer::{Indexer, IndexerError};
use search_storage::{update_documents, Client};

use crate::operations::{pack_any, OperationStore};
use crate::pb::google::longrunning::{operation, Operation};
use crate::pb::registry::search::v1::{IndexMetadata, IndexRequest, IndexResponse};
use crate::registry::Registry;

pub const INDEX_RESPONSE_TYPE: &str = "registry.search.v1.IndexResponse";
pub const INDEX_METADATA_TYPE: &str = "registry.search.v1.IndexMetadata";

/// Prefix of the names given to Index operations.
pub const OPERATION_PREFIX: &str = "operations/index/";

pub async fn index(
    client: &Client,
    registry: &dyn Registry,
    indexer: &Indexer,
    operations: &OperationStore,
    request: Request<IndexRequest>,
) -> Result<Response<Operation>, Status> {
    let req = request.into_inner();
    info!(resource_name = %req.resource_name, "Index request");

    if req.resource_name.is_empty() {
        return Err(Status::invalid_argument("resource_name is required"));
    }

    let mut session = client.session().await.map_err(|e| {
        warn!(error = %e, "Failed to open storage session");
        Status::unavailable(e.to_string())
    })?;

    let spec = registry
        .get_api_spec(&req.resource_name)
        .await
        .map_err(|e| Status::not_found(e.message().to_string()))?;

    let contents = registry
        .get_api_spec_contents(&spec.name)
        .await
        .map_err(|e| Status::internal(e.message().to_string()))?;

    let documents = indexer
        .documents_for_spec(&spec, &contents)
        .map_err(indexer_status)?;
    let document_count = documents.len();

    update_documents(&mut session, documents)
        .await
        .map_err(|e| Status::internal(format!("Storage error: {}", e)))?;

    let operation = Operation {
        name: format!("{}{}", OPERATION_PREFIX, ulid::Ulid::new()),
        metadata: Some(pack_any(
            INDEX_METADATA_TYPE,
            &IndexMetadata {
                resource_name: spec.name.clone(),
                document_count: i32::try_from(document_count).unwrap_or(i32::MAX),
            },
        )),
        done: true,
        result: Some(operation::Result::Response(pack_any(
            INDEX_RESPONSE_TYPE,
            &IndexResponse {
                message: "OK".to_string(),
            },
        ))),
    };
    operations.insert(operation.clone());

    info!(
        resource_name = %spec.name,
        document_count,
        operation = %operation.name,
        "Indexed spec"
    );
    Ok(Response::new(operation))
}

fn indexer_status(e: IndexerError) -> Status {
    match e {
        IndexerError::InvalidName(e) => Status::invalid_argument(e.to_string()),
        e => Status::internal(e.to_string()),
    }
}
