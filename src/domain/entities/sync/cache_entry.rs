use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationPayload, TripId, Version,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort, possibly-stale local snapshot of a remote entity.
///
/// The cache may be evicted, cleared or simply wrong at any time; no
/// correctness property of the sync engine depends on it. It exists so read
/// paths can degrade gracefully while offline, and it has no write-back path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub trip_id: TripId,
    pub data: OperationPayload,
    pub version: Option<Version>,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        entity_type: EntityType,
        entity_id: EntityId,
        trip_id: TripId,
        data: OperationPayload,
        version: Option<Version>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            trip_id,
            data,
            version,
            cached_at: Utc::now(),
        }
    }
}
