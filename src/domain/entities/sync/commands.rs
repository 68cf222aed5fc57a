use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationPayload, OperationType, TripId, Version,
};
use serde::{Deserialize, Serialize};

/// Draft used by client code to queue a write. The store assigns the
/// ordering keys; the queue service assigns the operation id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationDraft {
    pub trip_id: TripId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: OperationPayload,
    pub base_version: Option<Version>,
}

impl OperationDraft {
    pub fn new(
        trip_id: TripId,
        entity_type: EntityType,
        operation_type: OperationType,
        entity_id: Option<EntityId>,
        payload: OperationPayload,
        base_version: Option<Version>,
    ) -> Self {
        Self {
            trip_id,
            entity_type,
            operation_type,
            entity_id,
            payload,
            base_version,
        }
    }
}
