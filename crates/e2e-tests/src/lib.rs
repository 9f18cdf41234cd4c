//! End-to-end test infrastructure for registry search.
//!
//! Provides a shared TestHarness and spec fixtures for E2E tests covering the
//! full registry -> extraction -> storage -> query pipeline.

use std::sync::Arc;

use tonic::{Request, Status};

use search_indexer::{Indexer, IndexerConfig};
use search_service::pb::google::longrunning::Operation;
use search_service::pb::registry::search::v1::{
    query_response, search_server::Search, DeleteRequest, IndexRequest, QueryRequest,
};
use search_service::{InMemoryRegistry, Registry, SearchServiceImpl};
use search_storage::{Client, Query};
use search_types::{ApiSpec, Document, DOCUMENT_ENTITY};

pub const OPENAPI_MIME: &str = "application/x.openapi+gzip;version=3";
pub const SWAGGER_MIME: &str = "application/x.openapi+gzip;version=2";
pub const DISCOVERY_MIME: &str = "application/x.discovery+gzip";

/// Shared test harness for E2E tests.
///
/// Wires an in-memory SQLite store and an in-memory registry into a
/// `SearchServiceImpl` that tests call directly.
pub struct TestHarness {
    pub storage: Client,
    pub registry: Arc<InMemoryRegistry>,
    pub service: SearchServiceImpl,
}

impl TestHarness {
    /// Harness with summary-only extraction.
    pub async fn new() -> Self {
        Self::with_config(IndexerConfig::default()).await
    }

    /// Harness with method, schema and parameter documents enabled.
    pub async fn with_fragments() -> Self {
        Self::with_config(IndexerConfig { fragments: true }).await
    }

    pub async fn with_config(config: IndexerConfig) -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        Self::with_registry(config, registry.clone(), registry).await
    }

    /// Harness whose service reads from `service_registry`; `registry` stays
    /// available to the test for seeding.
    pub async fn with_registry(
        config: IndexerConfig,
        registry: Arc<InMemoryRegistry>,
        service_registry: Arc<dyn Registry>,
    ) -> Self {
        let storage = Client::open("sqlite", "sqlite::memory:")
            .await
            .expect("Failed to open test storage");
        let service = SearchServiceImpl::new(storage.clone(), service_registry, Indexer::new(config));
        Self {
            storage,
            registry,
            service,
        }
    }

    /// Add or replace a spec in the registry.
    pub async fn register(&self, name: &str, mime_type: &str, filename: &str, contents: &str) {
        self.registry
            .insert(
                ApiSpec::new(name, mime_type).with_filename(filename),
                contents.as_bytes().to_vec(),
            )
            .await;
    }

    pub async fn index(&self, name: &str) -> Result<Operation, Status> {
        self.service
            .index(Request::new(IndexRequest {
                resource_name: name.to_string(),
            }))
            .await
            .map(|r| r.into_inner())
    }

    pub async fn query(&self, q: &str) -> Result<Vec<query_response::Result>, Status> {
        self.service
            .query(Request::new(QueryRequest {
                q: q.to_string(),
                ..Default::default()
            }))
            .await
            .map(|r| r.into_inner().results)
    }

    /// Keys returned for `q`, in rank order.
    pub async fn query_keys(&self, q: &str) -> Vec<String> {
        self.query(q)
            .await
            .expect("query failed")
            .into_iter()
            .map(|r| r.key)
            .collect()
    }

    pub async fn delete(&self, name: &str) -> Result<i64, Status> {
        self.service
            .delete(Request::new(DeleteRequest {
                resource_name: name.to_string(),
            }))
            .await
            .map(|r| r.into_inner().deleted_count)
    }

    /// Every stored document, ordered by key.
    pub async fn stored_documents(&self) -> Vec<Document> {
        let mut session = self.storage.session().await.expect("Failed to open session");
        session
            .run(&Query::new(DOCUMENT_ENTITY))
            .await
            .expect("Failed to run query")
            .map(|(_, document)| document)
            .collect()
    }
}

/// Spec resource name in the `global` location.
pub fn spec_name(project: &str, api: &str, spec: &str) -> String {
    format!(
        "projects/{}/locations/global/apis/{}/versions/v1/specs/{}",
        project, api, spec
    )
}

/// OpenAPI 3 YAML with the given info and one `GET /items` operation.
pub fn openapi_v3(title: &str, description: &str, operation_id: &str) -> String {
    format!(
        "openapi: 3.0.0\ninfo:\n  title: {}\n  version: 1.0.0\n  description: {}\npaths:\n  /items:\n    get:\n      operationId: {}\n      summary: List items\n",
        title, description, operation_id
    )
}

/// Swagger 2.0 JSON with the given info.
pub fn swagger_v2(title: &str, description: &str) -> String {
    format!(
        r#"{{"swagger": "2.0", "info": {{"title": "{}", "version": "1.0.0", "description": "{}"}}, "paths": {{}}}}"#,
        title, description
    )
}

/// Discovery JSON with the given owner and title.
pub fn discovery(owner: &str, title: &str, description: &str) -> String {
    format!(
        r#"{{"kind": "discovery#restDescription", "ownerName": "{}", "title": "{}", "version": "v1", "description": "{}"}}"#,
        owner, title, description
    )
}
