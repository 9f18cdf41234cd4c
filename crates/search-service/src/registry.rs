//! Registry collaborator.
//!
//! The search service reads spec metadata and contents from an API registry.
//! [`GrpcRegistry`] talks to a registry server; [`InMemoryRegistry`] serves
//! specs registered in-process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::debug;

use search_types::ApiSpec;

use crate::pb::google::cloud::apigeeregistry::v1::{
    registry_client::RegistryClient, ApiSpec as ProtoApiSpec, GetApiSpecContentsRequest,
    GetApiSpecRequest,
};

/// Source of spec metadata and contents.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn get_api_spec(&self, name: &str) -> Result<ApiSpec, Status>;

    async fn get_api_spec_contents(&self, name: &str) -> Result<Vec<u8>, Status>;
}

impl From<ProtoApiSpec> for ApiSpec {
    fn from(spec: ProtoApiSpec) -> Self {
        ApiSpec {
            name: spec.name,
            filename: spec.filename,
            mime_type: spec.mime_type,
        }
    }
}

/// Registry reached over gRPC.
#[derive(Debug, Clone)]
pub struct GrpcRegistry {
    client: RegistryClient<Channel>,
}

impl GrpcRegistry {
    /// Create a client for `endpoint` without connecting. The connection is
    /// made on first use.
    pub fn connect_lazy(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(endpoint.to_string())?.connect_lazy();
        Ok(Self {
            client: RegistryClient::new(channel),
        })
    }
}

#[async_trait]
impl Registry for GrpcRegistry {
    async fn get_api_spec(&self, name: &str) -> Result<ApiSpec, Status> {
        debug!(name, "GetApiSpec");
        let spec = self
            .client
            .clone()
            .get_api_spec(GetApiSpecRequest {
                name: name.to_string(),
            })
            .await?
            .into_inner();
        Ok(spec.into())
    }

    async fn get_api_spec_contents(&self, name: &str) -> Result<Vec<u8>, Status> {
        debug!(name, "GetApiSpecContents");
        let body = self
            .client
            .clone()
            .get_api_spec_contents(GetApiSpecContentsRequest {
                name: name.to_string(),
            })
            .await?
            .into_inner();
        Ok(body.data)
    }
}

/// Registry backed by a map, for tests and local use.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    specs: RwLock<HashMap<String, (ApiSpec, Vec<u8>)>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a spec and its contents.
    pub async fn insert(&self, spec: ApiSpec, contents: impl Into<Vec<u8>>) {
        let name = spec.name.clone();
        self.specs.write().await.insert(name, (spec, contents.into()));
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.specs.write().await.remove(name).is_some()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn get_api_spec(&self, name: &str) -> Result<ApiSpec, Status> {
        self.specs
            .read()
            .await
            .get(name)
            .map(|(spec, _)| spec.clone())
            .ok_or_else(|| Status::not_found(format!("spec {} not found", name)))
    }

    async fn get_api_spec_contents(&self, name: &str) -> Result<Vec<u8>, Status> {
        self.specs
            .read()
            .await
            .get(name)
            .map(|(_, contents)| contents.clone())
            .ok_or_else(|| Status::not_found(format!("spec {} not found", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "projects/p/locations/global/apis/a/versions/v/specs/openapi.yaml";

    #[tokio::test]
    async fn test_in_memory_registry() {
        let registry = InMemoryRegistry::new();
        registry
            .insert(ApiSpec::new(NAME, "application/x.openapi"), "openapi: 3.0.0")
            .await;

        let spec = registry.get_api_spec(NAME).await.unwrap();
        assert_eq!(spec.mime_type, "application/x.openapi");
        let contents = registry.get_api_spec_contents(NAME).await.unwrap();
        assert_eq!(contents, b"openapi: 3.0.0");

        assert!(registry.remove(NAME).await);
        let err = registry.get_api_spec(NAME).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[test]
    fn test_proto_conversion() {
        let spec: ApiSpec = ProtoApiSpec {
            name: NAME.to_string(),
            filename: "openapi.yaml".to_string(),
            mime_type: "application/x.openapi+gzip;version=3".to_string(),
            ..Default::default()
        }
        .into();
        assert_eq!(spec.filename, "openapi.yaml");
        assert_eq!(spec.mime_type, "application/x.openapi+gzip;version=3");
    }

    #[tokio::test]
    async fn test_lazy_grpc_registry_rejects_bad_uri() {
        assert!(GrpcRegistry::connect_lazy("not a uri").is_err());
        assert!(GrpcRegistry::connect_lazy("http://localhost:8080").is_ok());
    }
}
