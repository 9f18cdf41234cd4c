//! Integration tests for the search daemon.
//!
//! These tests run the gRPC server on a local port and drive it through the
//! client library, from indexing through querying and deletion.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use search_client::{ClientError, SearchClient};
use search_indexer::{Indexer, IndexerConfig};
use search_service::{run_server_with_shutdown, InMemoryRegistry, SearchServiceImpl};
use search_storage::Client;
use search_types::ApiSpec;

const PETSTORE: &str = "projects/demo/locations/global/apis/petstore/versions/v1/specs/openapi";

const PETSTORE_YAML: &str = r#"
openapi: 3.0.0
info:
  title: Pet Store
  version: 1.0.0
  description: Find pets
paths:
  /pets:
    get:
      operationId: listPets
      summary: List all pets
"#;

/// Test harness that manages server lifecycle.
struct TestHarness {
    registry: Arc<InMemoryRegistry>,
    endpoint: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    _server_handle: tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
}

impl TestHarness {
    /// Create a new test harness with a running server.
    async fn new(port: u16, fragments: bool) -> Self {
        let storage = Client::open("sqlite", "sqlite::memory:")
            .await
            .expect("Failed to open storage");
        let registry = Arc::new(InMemoryRegistry::new());
        registry
            .insert(
                ApiSpec::new(PETSTORE, "application/x.openapi+gzip;version=3")
                    .with_filename("openapi.yaml"),
                PETSTORE_YAML,
            )
            .await;

        let service = SearchServiceImpl::new(
            storage,
            registry.clone(),
            Indexer::new(IndexerConfig { fragments }),
        );

        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server_handle = tokio::spawn(async move {
            run_server_with_shutdown(addr, service, async {
                shutdown_rx.await.ok();
            })
            .await
        });

        // Wait for server to start
        sleep(Duration::from_millis(200)).await;

        Self {
            registry,
            endpoint: format!("http://127.0.0.1:{}", port),
            shutdown_tx: Some(shutdown_tx),
            _server_handle: server_handle,
        }
    }

    /// Create a client connected to this harness.
    async fn client(&self) -> SearchClient {
        // Retry connection a few times
        for _ in 0..5 {
            match SearchClient::connect(&self.endpoint).await {
                Ok(client) => return client,
                Err(_) => sleep(Duration::from_millis(100)).await,
            }
        }
        panic!("Failed to connect to server at {}", self.endpoint);
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[tokio::test]
async fn test_index_query_lifecycle() {
    let harness = TestHarness::new(50161, false).await;
    let mut client = harness.client().await;

    let outcome = client.index(PETSTORE).await.unwrap();
    assert!(outcome.done);
    assert_eq!(outcome.message, "OK");
    assert_eq!(outcome.resource_name, PETSTORE);
    assert_eq!(outcome.document_count, 1);

    let results = client.query("pets").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, PETSTORE);
    assert!(results[0].excerpt.contains("**pets**"));
}

#[tokio::test]
async fn test_operation_polling() {
    let harness = TestHarness::new(50162, false).await;
    let mut client = harness.client().await;

    let outcome = client.index(PETSTORE).await.unwrap();

    let polled = client.get_operation(&outcome.operation_name).await.unwrap();
    assert!(polled.done);
    assert_eq!(polled.name, outcome.operation_name);

    let waited = client
        .wait_operation(&outcome.operation_name, Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert!(waited.done);

    let err = client
        .get_operation("operations/index/unknown")
        .await
        .unwrap_err();
    match err {
        ClientError::Rpc(status) => assert_eq!(status.code(), tonic::Code::NotFound),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_index_unknown_spec_is_not_found() {
    let harness = TestHarness::new(50163, false).await;
    let mut client = harness.client().await;

    let err = client
        .index("projects/demo/locations/global/apis/petstore/versions/v1/specs/missing")
        .await
        .unwrap_err();
    match err {
        ClientError::Rpc(status) => assert_eq!(status.code(), tonic::Code::NotFound),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_with_fragments() {
    let harness = TestHarness::new(50164, true).await;
    let mut client = harness.client().await;

    let outcome = client.index(PETSTORE).await.unwrap();
    assert_eq!(outcome.document_count, 2);

    assert_eq!(client.delete(PETSTORE).await.unwrap(), 2);
    assert!(client.query("pets").await.unwrap().is_empty());
    assert_eq!(client.delete(PETSTORE).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reindex_after_registry_update() {
    let harness = TestHarness::new(50165, false).await;
    let mut client = harness.client().await;

    client.index(PETSTORE).await.unwrap();

    harness
        .registry
        .insert(
            ApiSpec::new(PETSTORE, "application/x.openapi").with_filename("openapi.yaml"),
            "openapi: 3.0.0\ninfo:\n  title: Animal Shelter\n  description: Adopt cats\n",
        )
        .await;
    client.index(PETSTORE).await.unwrap();

    assert!(client.query("pets").await.unwrap().is_empty());
    let results = client.query("cats").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, PETSTORE);
}
