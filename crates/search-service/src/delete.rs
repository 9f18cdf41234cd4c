//! Delete RPC implementation.

use tonic::{Request, Response, Status};
use tracing::{info, warn};

use search_storage::{delete_resource_documents, Client};

use crate::pb::registry::search::v1::{DeleteRequest, DeleteResponse};

/// Remove every document whose owning resource is `resource_name`.
pub async fn delete(
    client: &Client,
    request: Request<DeleteRequest>,
) -> Result<Response<DeleteResponse>, Status> {
    let req = request.into_inner();
    info!(resource_name = %req.resource_name, "Delete request");

    if req.resource_name.is_empty() {
        return Err(Status::invalid_argument("resource_name is required"));
    }

    let mut session = client.session().await.map_err(|e| {
        warn!(error = %e, "Failed to open storage session");
        Status::unavailable(e.to_string())
    })?;

    let deleted = delete_resource_documents(&mut session, &req.resource_name)
        .await
        .map_err(|e| Status::internal(format!("Storage error: {}", e)))?;

    Ok(Response::new(DeleteResponse {
        deleted_count: i64::try_from(deleted).unwrap_or(i64::MAX),
    }))
}
