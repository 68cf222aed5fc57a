use crate::domain::entities::sync::{CacheEntry, OperationDraft, QueuedOperation, TripQueueStats};
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationStatus, TripId,
};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Transactional local store backing the offline queue and the snapshot
/// cache. The only shared mutable resource in the engine: every state
/// transition goes through this contract, never through field mutation.
///
/// The store may legitimately be empty at any time (storage eviction);
/// consumers must treat that as a valid state, not a bug signal.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Persists a draft under the given client-generated id. The store
    /// stamps `enqueued_at` and assigns the monotonic `seq` tiebreak.
    async fn enqueue(
        &self,
        id: OperationId,
        draft: OperationDraft,
    ) -> Result<QueuedOperation, AppError>;

    /// Pending operations for one trip in strict replay order:
    /// `enqueued_at` ascending, ties broken by `seq`.
    async fn list_pending(&self, trip_id: &TripId) -> Result<Vec<QueuedOperation>, AppError>;

    async fn list_failed(&self, trip_id: &TripId) -> Result<Vec<QueuedOperation>, AppError>;

    async fn mark_status(
        &self,
        id: &OperationId,
        status: OperationStatus,
    ) -> Result<(), AppError>;

    /// Increments the retry counter and returns the new value.
    async fn increment_retry(&self, id: &OperationId) -> Result<u32, AppError>;

    /// Removes a confirmed operation after remote success.
    async fn remove(&self, id: &OperationId) -> Result<(), AppError>;

    /// Removes an operation only while it is `failed`; the user-facing
    /// discard path. Returns false when the operation no longer exists or
    /// has since left the failed state, so a stale acknowledgment can never
    /// destroy a write that was not applied.
    async fn discard_failed(&self, id: &OperationId) -> Result<bool, AppError>;

    /// Manual-retry support: flips every `failed` operation of the trip back
    /// to `pending`. Returns how many were reset.
    async fn reset_failed(&self, trip_id: &TripId) -> Result<u32, AppError>;

    async fn put_cache(&self, entry: CacheEntry) -> Result<(), AppError>;

    async fn get_cache(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<CacheEntry>, AppError>;

    /// Drops every cached snapshot for a trip. Returns how many were evicted.
    async fn evict_cache(&self, trip_id: &TripId) -> Result<u32, AppError>;

    /// Wipes the whole snapshot cache, e.g. under storage pressure or on
    /// sign-out. The queue is untouched.
    async fn clear_cache(&self) -> Result<u32, AppError>;

    /// Counts read directly from the table, never from in-memory counters.
    async fn queue_stats(&self, trip_id: &TripId) -> Result<TripQueueStats, AppError>;

    /// Trips that currently have pending work, for per-trip parallel passes.
    async fn trips_with_pending(&self) -> Result<Vec<TripId>, AppError>;
}
