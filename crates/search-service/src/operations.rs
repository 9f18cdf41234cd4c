//! Long-running operation records.
//!
//! Index completes before it returns, so every recorded operation is already
//! done. The store keeps the most recent ones so callers can poll or wait on
//! the returned name.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use prost::Message;
use prost_types::Any;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::pb::google::longrunning::{
    operations_server::Operations, GetOperationRequest, Operation, WaitOperationRequest,
};

/// Number of operations kept for polling.
pub const DEFAULT_CAPACITY: usize = 1024;

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Pack a message into an `Any` under its fully-qualified type name.
pub fn pack_any<M: Message>(full_name: &str, message: &M) -> Any {
    Any {
        type_url: format!("{}{}", TYPE_URL_PREFIX, full_name),
        value: message.encode_to_vec(),
    }
}

/// Unpack an `Any` holding `full_name`. Returns `None` for other types.
pub fn unpack_any<M: Message + Default>(full_name: &str, any: &Any) -> Option<M> {
    let name = any.type_url.strip_prefix(TYPE_URL_PREFIX)?;
    if name != full_name {
        return None;
    }
    M::decode(any.value.as_slice()).ok()
}

/// Bounded in-process store of operations, keyed by name.
pub struct OperationStore {
    operations: Mutex<LruCache<String, Operation>>,
}

impl OperationStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            operations: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn insert(&self, operation: Operation) {
        let mut operations = self.operations.lock().unwrap_or_else(PoisonError::into_inner);
        operations.put(operation.name.clone(), operation);
    }

    pub fn get(&self, name: &str) -> Option<Operation> {
        let mut operations = self.operations.lock().unwrap_or_else(PoisonError::into_inner);
        operations.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OperationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// `google.longrunning.Operations` over an [`OperationStore`].
#[derive(Clone)]
pub struct OperationsService {
    store: Arc<OperationStore>,
}

impl OperationsService {
    pub fn new(store: Arc<OperationStore>) -> Self {
        Self { store }
    }

    fn lookup(&self, name: &str) -> Result<Operation, Status> {
        if name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        self.store
            .get(name)
            .ok_or_else(|| Status::not_found(format!("operation {} not found", name)))
    }
}

#[tonic::async_trait]
impl Operations for OperationsService {
    async fn get_operation(
        &self,
        request: Request<GetOperationRequest>,
    ) -> Result<Response<Operation>, Status> {
        let req = request.into_inner();
        debug!(name = %req.name, "GetOperation request");
        self.lookup(&req.name).map(Response::new)
    }

    /// Operations are recorded already done, so waiting returns at once.
    async fn wait_operation(
        &self,
        request: Request<WaitOperationRequest>,
    ) -> Result<Response<Operation>, Status> {
        let req = request.into_inner();
        debug!(name = %req.name, "WaitOperation request");
        self.lookup(&req.name).map(Response::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::registry::search::v1::IndexResponse;

    const INDEX_RESPONSE: &str = "registry.search.v1.IndexResponse";

    fn operation(name: &str) -> Operation {
        Operation {
            name: name.to_string(),
            done: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_any_round_trip_checks_type() {
        let any = pack_any(INDEX_RESPONSE, &IndexResponse { message: "OK".to_string() });
        assert_eq!(any.type_url, "type.googleapis.com/registry.search.v1.IndexResponse");

        let unpacked: IndexResponse = unpack_any(INDEX_RESPONSE, &any).unwrap();
        assert_eq!(unpacked.message, "OK");
        assert!(unpack_any::<IndexResponse>("registry.search.v1.Other", &any).is_none());
    }

    #[test]
    fn test_store_evicts_least_recent() {
        let store = OperationStore::new(2);
        store.insert(operation("a"));
        store.insert(operation("b"));
        assert!(store.get("a").is_some());
        store.insert(operation("c"));

        assert!(store.get("b").is_none());
        assert!(store.get("a").is_some());
        assert!(store.get("c").is_some());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_and_wait() {
        let store = Arc::new(OperationStore::default());
        store.insert(operation("operations/index/1"));
        let service = OperationsService::new(store);

        let op = service
            .get_operation(Request::new(GetOperationRequest {
                name: "operations/index/1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(op.done);

        let op = service
            .wait_operation(Request::new(WaitOperationRequest {
                name: "operations/index/1".to_string(),
                timeout: None,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(op.name, "operations/index/1");
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let service = OperationsService::new(Arc::new(OperationStore::default()));
        let err = service
            .get_operation(Request::new(GetOperationRequest {
                name: "operations/index/missing".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);

        let err = service
            .get_operation(Request::new(GetOperationRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
}
