//! Search client for connecting to the daemon.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use search_service::index::{INDEX_METADATA_TYPE, INDEX_RESPONSE_TYPE};
use search_service::operations::unpack_any;
use search_service::pb::google::longrunning::{
    operation, operations_client::OperationsClient, GetOperationRequest, Operation,
    WaitOperationRequest,
};
use search_service::pb::registry::search::v1::{
    query_response, search_client::SearchClient as SearchServiceClient, DeleteRequest,
    IndexMetadata, IndexRequest, IndexResponse, QueryRequest,
};

use crate::error::ClientError;

/// Default endpoint for the search daemon.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:50061";

/// One ranked query result.
pub type QueryResult = query_response::Result;

/// Decoded result of an Index operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutcome {
    pub operation_name: String,
    pub done: bool,
    pub resource_name: String,
    pub document_count: i32,
    /// Empty until the operation is done.
    pub message: String,
}

/// Client for communicating with the search daemon.
pub struct SearchClient {
    search: SearchServiceClient<Channel>,
    operations: OperationsClient<Channel>,
}

impl SearchClient {
    /// Connect to the search daemon.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the endpoint is invalid or
    /// unreachable.
    pub async fn connect(endpoint: &str) -> Result<Self, ClientError> {
        info!("Connecting to search daemon at {}", endpoint);
        let channel = Endpoint::from_shared(endpoint.to_string())?
            .connect()
            .await?;
        Ok(Self {
            search: SearchServiceClient::new(channel.clone()),
            operations: OperationsClient::new(channel),
        })
    }

    /// Connect to the default endpoint.
    pub async fn connect_default() -> Result<Self, ClientError> {
        Self::connect(DEFAULT_ENDPOINT).await
    }

    /// Index a spec resource and decode the returned operation.
    pub async fn index(&mut self, resource_name: &str) -> Result<IndexOutcome, ClientError> {
        debug!("Index request: {}", resource_name);
        let operation = self
            .search
            .index(IndexRequest {
                resource_name: resource_name.to_string(),
            })
            .await?
            .into_inner();
        decode_index_outcome(operation)
    }

    /// Run a ranked full-text query and return every match.
    pub async fn query(&mut self, q: &str) -> Result<Vec<QueryResult>, ClientError> {
        debug!("Query request: {}", q);
        let response = self
            .search
            .query(QueryRequest {
                q: q.to_string(),
                ..Default::default()
            })
            .await?
            .into_inner();
        Ok(response.results)
    }

    /// Remove the documents of a resource. Returns how many were removed.
    pub async fn delete(&mut self, resource_name: &str) -> Result<i64, ClientError> {
        debug!("Delete request: {}", resource_name);
        let response = self
            .search
            .delete(DeleteRequest {
                resource_name: resource_name.to_string(),
            })
            .await?
            .into_inner();
        Ok(response.deleted_count)
    }

    pub async fn get_operation(&mut self, name: &str) -> Result<Operation, ClientError> {
        let response = self
            .operations
            .get_operation(GetOperationRequest {
                name: name.to_string(),
            })
            .await?;
        Ok(response.into_inner())
    }

    pub async fn wait_operation(
        &mut self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Operation, ClientError> {
        let timeout = timeout.and_then(|t| prost_types::Duration::try_from(t).ok());
        let response = self
            .operations
            .wait_operation(WaitOperationRequest {
                name: name.to_string(),
                timeout,
            })
            .await?;
        Ok(response.into_inner())
    }
}

/// Decode the metadata and response packed into an Index operation.
///
/// An operation that finished with an error becomes `ClientError::Operation`.
pub fn decode_index_outcome(operation: Operation) -> Result<IndexOutcome, ClientError> {
    let metadata: IndexMetadata = match &operation.metadata {
        Some(any) => unpack_any(INDEX_METADATA_TYPE, any)
            .ok_or_else(|| ClientError::Decode(any.type_url.clone()))?,
        None => IndexMetadata::default(),
    };

    let message = match operation.result {
        Some(operation::Result::Response(any)) => {
            let response: IndexResponse = unpack_any(INDEX_RESPONSE_TYPE, &any)
                .ok_or_else(|| ClientError::Decode(any.type_url.clone()))?;
            response.message
        }
        Some(operation::Result::Error(status)) => {
            return Err(ClientError::Operation {
                name: operation.name,
                code: status.code,
                message: status.message,
            })
        }
        None => String::new(),
    };

    Ok(IndexOutcome {
        operation_name: operation.name,
        done: operation.done,
        resource_name: metadata.resource_name,
        document_count: metadata.document_count,
        message,
    })
}
