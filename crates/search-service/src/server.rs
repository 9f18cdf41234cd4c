//! gRPC server setup with health check and reflection.

use std::future::Future;
use std::net::SocketAddr;

use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tonic_reflection::server::Builder as ReflectionBuilder;
use tracing::info;

use crate::pb::google::longrunning::operations_server::OperationsServer;
use crate::pb::registry::search::v1::search_server::SearchServer;
use crate::pb::FILE_DESCRIPTOR_SET;
use crate::service::SearchServiceImpl;

/// Run the gRPC server until the process is stopped.
pub async fn run_server(
    addr: SocketAddr,
    service: SearchServiceImpl,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_server_with_shutdown(addr, service, std::future::pending()).await
}

/// Run the gRPC server with graceful shutdown support.
///
/// Serves Search, Operations, health and reflection until `shutdown_signal`
/// resolves.
pub async fn run_server_with_shutdown<F>(
    addr: SocketAddr,
    service: SearchServiceImpl,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting gRPC server on {}", addr);

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<SearchServer<SearchServiceImpl>>()
        .await;

    let reflection_service = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let operations_service = service.operations_service();

    info!("gRPC server ready on {}", addr);

    Server::builder()
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(SearchServer::new(service))
        .add_service(OperationsServer::new(operations_service))
        .serve_with_shutdown(addr, shutdown_signal)
        .await?;

    info!("gRPC server shutdown complete");
    Ok(())
}
