//! Search gRPC service.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use search_indexer::Indexer;
use search_storage::Client;

use crate::delete;
use crate::index;
use crate::operations::{OperationStore, OperationsService};
use crate::pb::google::longrunning::Operation;
use crate::pb::registry::search::v1::{
    search_server::Search, DeleteRequest, DeleteResponse, IndexRequest, QueryRequest,
    QueryResponse,
};
use crate::query;
use crate::registry::Registry;

/// Implementation of the Search gRPC service.
#[derive(Clone)]
pub struct SearchServiceImpl {
    client: Client,
    registry: Arc<dyn Registry>,
    indexer: Indexer,
    operations: Arc<OperationStore>,
}

impl SearchServiceImpl {
    pub fn new(client: Client, registry: Arc<dyn Registry>, indexer: Indexer) -> Self {
        Self {
            client,
            registry,
            indexer,
            operations: Arc::new(OperationStore::default()),
        }
    }

    /// Operations service sharing this service's operation store.
    pub fn operations_service(&self) -> OperationsService {
        OperationsService::new(self.operations.clone())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[tonic::async_trait]
impl Search for SearchServiceImpl {
    async fn index(&self, request: Request<IndexRequest>) -> Result<Response<Operation>, Status> {
        index::index(
            &self.client,
            self.registry.as_ref(),
            &self.indexer,
            &self.operations,
            request,
        )
        .await
    }

    async fn query(
        &self,
        request: Request<QueryRequest>,
    ) -> Result<Response<QueryResponse>, Status> {
        query::query(&self.client, request).await
    }

    async fn delete(
        &self,
        request: Request<DeleteRequest>,
    ) -> Result<Response<DeleteResponse>, Status> {
        delete::delete(&self.client, request).await
    }
}
