use crate::application::ports::auth::AuthContext;
use crate::domain::entities::sync::QueuedOperation;
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationType, TripId, Version,
};
use async_trait::async_trait;
use serde_json::Value;

/// One write request against the remote backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteWrite {
    pub trip_id: TripId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: Value,
    /// Idempotency token; the backend enforces a unique constraint on it,
    /// so redelivery of the same token is rejected as a duplicate rather
    /// than applied twice.
    pub client_operation_id: OperationId,
    /// Version fence for last-write-wins entities. `None` skips the fence.
    pub expected_version: Option<Version>,
}

impl RemoteWrite {
    pub fn from_operation(op: &QueuedOperation) -> Self {
        Self {
            trip_id: op.trip_id.clone(),
            entity_type: op.entity_type,
            operation_type: op.operation_type,
            entity_id: op.entity_id.clone(),
            payload: op.payload.as_json().clone(),
            client_operation_id: op.id.clone(),
            expected_version: op.base_version,
        }
    }
}

/// Authoritative result of a successful remote write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteAck {
    /// Id of the entity the backend created, for `create` operations.
    pub entity_id: Option<EntityId>,
    pub version: Option<Version>,
    /// Post-write entity state, used to refresh the local cache.
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Transient remote failure: {0}")]
    Transient(String),

    /// The idempotency token was already consumed; the first delivery won.
    #[error("Operation was already applied")]
    DuplicateOperation,

    #[error("Version fence rejected the write; remote is at {current}")]
    VersionConflict { current: Version },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Entity is permanently gone: {0}")]
    EntityGone(String),

    #[error("Payload rejected as invalid: {0}")]
    InvalidPayload(String),
}

/// RPC surface of the hosted backend. Transport is irrelevant here; only
/// the three-way outcome contract (success / retryable / fatal) matters.
/// The crate ships no transport implementation of its own.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn apply_write(
        &self,
        auth: &AuthContext,
        write: RemoteWrite,
    ) -> Result<RemoteAck, RemoteError>;

    /// Current remote version of an entity, `None` if the backend does not
    /// version it.
    async fn fetch_version(
        &self,
        auth: &AuthContext,
        trip_id: &TripId,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<Version>, RemoteError>;
}
