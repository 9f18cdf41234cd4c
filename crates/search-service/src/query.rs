//! Query RPC implementation.

use tonic::{Request, Response, Status};
use tracing::{debug, warn};

use search_storage::{search_documents, Client, SearchHit};

use crate::pb::registry::search::v1::{query_response, QueryRequest, QueryResponse};

/// Run a ranked full-text query.
///
/// All matches are returned in one response; `page_size` and `page_token`
/// are accepted but not applied, and `next_page_token` is always empty.
pub async fn query(
    client: &Client,
    request: Request<QueryRequest>,
) -> Result<Response<QueryResponse>, Status> {
    let req = request.into_inner();
    debug!(q = %req.q, page_size = req.page_size, "Query request");

    let mut session = client.session().await.map_err(|e| {
        warn!(error = %e, "Failed to open storage session");
        Status::unavailable(e.to_string())
    })?;

    let hits = search_documents(&mut session, &req.q)
        .await
        .map_err(|e| Status::internal(format!("Storage error: {}", e)))?;

    debug!(results = hits.len(), "Query complete");
    Ok(Response::new(QueryResponse {
        results: hits.into_iter().map(hit_to_proto).collect(),
        next_page_token: String::new(),
    }))
}

fn hit_to_proto(hit: SearchHit) -> query_response::Result {
    query_response::Result {
        key: hit.key,
        excerpt: hit.excerpt,
    }
}
