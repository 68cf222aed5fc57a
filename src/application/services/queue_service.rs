use crate::application::ports::sync_store::SyncStore;
use crate::application::services::stats::StatsPublisher;
use crate::domain::entities::sync::{
    CacheEntry, OperationDraft, QueuedOperation, TripQueueStats,
};
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationType, TripId,
};
use crate::shared::error::AppError;
use std::sync::Arc;

/// Enqueue path for offline writes.
///
/// Validates the draft, assigns the client-generated operation id that
/// doubles as the idempotency token, persists it, and optimistically
/// refreshes the local snapshot cache. Also hosts the manual queue actions
/// (retry failed, discard) that the failed-state UI drives.
pub struct QueueService {
    store: Arc<dyn SyncStore>,
    stats: StatsPublisher,
}

impl QueueService {
    pub fn new(store: Arc<dyn SyncStore>, stats: StatsPublisher) -> Self {
        Self { store, stats }
    }

    /// Queues a write performed while disconnected.
    ///
    /// Hard-blocked entity types (the basecamp record) are rejected here,
    /// synchronously, before anything is persisted: a stale offline replay
    /// must never overwrite the most shared piece of trip state.
    pub async fn enqueue(&self, draft: OperationDraft) -> Result<QueuedOperation, AppError> {
        Self::validate(&draft)?;

        let id = OperationId::generate();
        let trip_id = draft.trip_id.clone();
        let cache_entry = Self::optimistic_cache_entry(&draft);

        let op = self.store.enqueue(id, draft).await?;

        // Best-effort snapshot so offline reads see the user's own write.
        if let Some(entry) = cache_entry {
            if let Err(err) = self.store.put_cache(entry).await {
                tracing::warn!(error = %err, "Optimistic cache write failed");
            }
        }

        self.refresh_stats(&trip_id).await;

        tracing::debug!(
            operation_id = %op.id,
            trip_id = %op.trip_id,
            entity_type = %op.entity_type,
            "Queued offline operation"
        );
        Ok(op)
    }

    /// Flips the trip's failed operations back to pending. Explicit user
    /// action; failed operations are never retried automatically.
    pub async fn retry_failed(&self, trip_id: &TripId) -> Result<u32, AppError> {
        let reset = self.store.reset_failed(trip_id).await?;
        if reset > 0 {
            self.refresh_stats(trip_id).await;
        }
        Ok(reset)
    }

    /// User acknowledgment of a failed operation: removes it for good.
    /// Only removes while the operation is still `failed`; a stale id, or
    /// one that raced back to `pending`, is rejected instead of destroying
    /// a write that was never applied.
    pub async fn discard_failed(
        &self,
        trip_id: &TripId,
        id: &OperationId,
    ) -> Result<(), AppError> {
        if !self.store.discard_failed(id).await? {
            return Err(AppError::Validation(format!(
                "Operation {id} is not in the failed state"
            )));
        }
        self.refresh_stats(trip_id).await;
        Ok(())
    }

    pub async fn list_failed(&self, trip_id: &TripId) -> Result<Vec<QueuedOperation>, AppError> {
        self.store.list_failed(trip_id).await
    }

    pub async fn cached(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<CacheEntry>, AppError> {
        self.store.get_cache(entity_type, entity_id).await
    }

    pub async fn queue_stats(&self, trip_id: &TripId) -> Result<TripQueueStats, AppError> {
        self.store.queue_stats(trip_id).await
    }

    /// Stats feed the banner UI only; a refresh failure must never turn a
    /// durably persisted write into an error for the caller.
    async fn refresh_stats(&self, trip_id: &TripId) {
        if let Err(err) = self.stats.refresh(self.store.as_ref(), trip_id).await {
            tracing::warn!(error = %err, trip_id = %trip_id, "Queue stats refresh failed");
        }
    }

    fn validate(draft: &OperationDraft) -> Result<(), AppError> {
        if !draft.entity_type.offline_writable() {
            return Err(AppError::OfflineWriteBlocked(
                draft.entity_type.as_str().to_string(),
            ));
        }

        match draft.operation_type {
            OperationType::Create => {
                if draft.entity_id.is_some() {
                    return Err(AppError::Validation(
                        "Create operations must not carry an entity id".to_string(),
                    ));
                }
            }
            OperationType::Update | OperationType::Delete => {
                if draft.entity_id.is_none() {
                    return Err(AppError::Validation(format!(
                        "{} operations require an entity id",
                        draft.operation_type
                    )));
                }
            }
        }

        if !draft.payload.is_object() {
            return Err(AppError::Validation(
                "Operation payload must be a JSON object".to_string(),
            ));
        }

        Ok(())
    }

    fn optimistic_cache_entry(draft: &OperationDraft) -> Option<CacheEntry> {
        let entity_id = draft.entity_id.clone()?;
        if draft.operation_type == OperationType::Delete {
            return None;
        }
        Some(CacheEntry::new(
            draft.entity_type,
            entity_id,
            draft.trip_id.clone(),
            draft.payload.clone(),
            draft.base_version,
        ))
    }
}
