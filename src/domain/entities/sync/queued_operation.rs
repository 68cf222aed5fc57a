use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationPayload, OperationStatus, OperationType, TripId,
    Version,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A write the user performed while disconnected, recorded append-only.
///
/// Created exactly once by the enqueue path and destroyed exactly once by the
/// sync processor after confirmed remote success. Only `status` and
/// `retry_count` mutate after creation; everything else is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedOperation {
    pub id: OperationId,
    /// Secondary monotonic tiebreak assigned at enqueue time; wall-clock
    /// milliseconds alone are not a safe sort key under clock coarseness.
    pub seq: i64,
    pub trip_id: TripId,
    pub entity_type: EntityType,
    pub operation_type: OperationType,
    pub entity_id: Option<EntityId>,
    pub payload: OperationPayload,
    /// Remote version the operation assumes as its base, for the
    /// last-write-wins fence. Absent for appends and creates.
    pub base_version: Option<Version>,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub status: OperationStatus,
}

impl QueuedOperation {
    /// Key used to preserve relative order among operations touching the
    /// same entity within one sync pass.
    pub fn entity_key(&self) -> Option<(EntityType, EntityId)> {
        self.entity_id
            .as_ref()
            .map(|entity_id| (self.entity_type, entity_id.clone()))
    }
}
