use crate::application::ports::sync_store::SyncStore;
use crate::domain::entities::sync::{CacheEntry, OperationDraft, QueuedOperation, TripQueueStats};
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationStatus, TripId,
};
use crate::infrastructure::database::mappers::{cache_entry_from_row, queued_operation_from_row};
use crate::infrastructure::database::rows::{CacheRow, SyncQueueRow};
use crate::infrastructure::database::schema::initialize_schema;
use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

/// SQLx-backed implementation of the local durable store.
///
/// The AUTOINCREMENT `seq` column is the secondary ordering key assigned at
/// enqueue time; `(enqueued_at, seq)` gives a total replay order even when
/// the wall clock is coarse.
pub struct SqliteSyncStore {
    pool: Pool<Sqlite>,
}

impl SqliteSyncStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Opens the configured database and ensures the schema exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        initialize_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn fetch_by_seq(&self, seq: i64) -> Result<QueuedOperation, AppError> {
        let row = sqlx::query_as::<_, SyncQueueRow>(
            r#"
            SELECT seq, operation_id, trip_id, entity_type, operation_type,
                   entity_id, payload, base_version, enqueued_at, retry_count, status
            FROM sync_queue
            WHERE seq = ?1
            "#,
        )
        .bind(seq)
        .fetch_one(&self.pool)
        .await?;

        queued_operation_from_row(row)
    }

    async fn list_with_status(
        &self,
        trip_id: &TripId,
        status: OperationStatus,
    ) -> Result<Vec<QueuedOperation>, AppError> {
        let rows = sqlx::query_as::<_, SyncQueueRow>(
            r#"
            SELECT seq, operation_id, trip_id, entity_type, operation_type,
                   entity_id, payload, base_version, enqueued_at, retry_count, status
            FROM sync_queue
            WHERE trip_id = ?1 AND status = ?2
            ORDER BY enqueued_at ASC, seq ASC
            "#,
        )
        .bind(trip_id.as_str())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(queued_operation_from_row).collect()
    }
}

#[async_trait]
impl SyncStore for SqliteSyncStore {
    async fn enqueue(
        &self,
        id: OperationId,
        draft: OperationDraft,
    ) -> Result<QueuedOperation, AppError> {
        let payload = serde_json::to_string(draft.payload.as_json())?;
        let enqueued_at = Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO sync_queue (
                operation_id, trip_id, entity_type, operation_type,
                entity_id, payload, base_version, enqueued_at, retry_count, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 'pending')
            "#,
        )
        .bind(id.as_str())
        .bind(draft.trip_id.as_str())
        .bind(draft.entity_type.as_str())
        .bind(draft.operation_type.as_str())
        .bind(draft.entity_id.as_ref().map(|e| e.as_str().to_string()))
        .bind(&payload)
        .bind(draft.base_version.map(i64::from))
        .bind(enqueued_at)
        .execute(&self.pool)
        .await?;

        self.fetch_by_seq(result.last_insert_rowid()).await
    }

    async fn list_pending(&self, trip_id: &TripId) -> Result<Vec<QueuedOperation>, AppError> {
        self.list_with_status(trip_id, OperationStatus::Pending).await
    }

    async fn list_failed(&self, trip_id: &TripId) -> Result<Vec<QueuedOperation>, AppError> {
        self.list_with_status(trip_id, OperationStatus::Failed).await
    }

    async fn mark_status(
        &self,
        id: &OperationId,
        status: OperationStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE sync_queue SET status = ?1 WHERE operation_id = ?2")
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_retry(&self, id: &OperationId) -> Result<u32, AppError> {
        sqlx::query("UPDATE sync_queue SET retry_count = retry_count + 1 WHERE operation_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        let (retry_count,): (i64,) =
            sqlx::query_as("SELECT retry_count FROM sync_queue WHERE operation_id = ?1")
                .bind(id.as_str())
                .fetch_one(&self.pool)
                .await?;

        u32::try_from(retry_count)
            .map_err(|_| AppError::Database("Negative retry count".to_string()))
    }

    async fn remove(&self, id: &OperationId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sync_queue WHERE operation_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn discard_failed(&self, id: &OperationId) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM sync_queue WHERE operation_id = ?1 AND status = 'failed'")
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset_failed(&self, trip_id: &TripId) -> Result<u32, AppError> {
        let result = sqlx::query(
            "UPDATE sync_queue SET status = 'pending' WHERE trip_id = ?1 AND status = 'failed'",
        )
        .bind(trip_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as u32)
    }

    async fn put_cache(&self, entry: CacheEntry) -> Result<(), AppError> {
        let data = serde_json::to_string(entry.data.as_json())?;

        sqlx::query(
            r#"
            INSERT INTO cache (entity_type, entity_id, trip_id, data, version, cached_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                trip_id = excluded.trip_id,
                data = excluded.data,
                version = excluded.version,
                cached_at = excluded.cached_at
            "#,
        )
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id.as_str())
        .bind(entry.trip_id.as_str())
        .bind(&data)
        .bind(entry.version.map(i64::from))
        .bind(entry.cached_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cache(
        &self,
        entity_type: EntityType,
        entity_id: &EntityId,
    ) -> Result<Option<CacheEntry>, AppError> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT entity_type, entity_id, trip_id, data, version, cached_at
            FROM cache
            WHERE entity_type = ?1 AND entity_id = ?2
            "#,
        )
        .bind(entity_type.as_str())
        .bind(entity_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(cache_entry_from_row).transpose()
    }

    async fn evict_cache(&self, trip_id: &TripId) -> Result<u32, AppError> {
        let result = sqlx::query("DELETE FROM cache WHERE trip_id = ?1")
            .bind(trip_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as u32)
    }

    async fn clear_cache(&self) -> Result<u32, AppError> {
        let result = sqlx::query("DELETE FROM cache")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as u32)
    }

    async fn queue_stats(&self, trip_id: &TripId) -> Result<TripQueueStats, AppError> {
        let (pending,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sync_queue WHERE trip_id = ?1 AND status IN ('pending', 'syncing')",
        )
        .bind(trip_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        let (failed,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sync_queue WHERE trip_id = ?1 AND status = 'failed'",
        )
        .bind(trip_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(TripQueueStats {
            pending_count: pending as u32,
            failed_count: failed as u32,
        })
    }

    async fn trips_with_pending(&self) -> Result<Vec<TripId>, AppError> {
        let trip_ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT trip_id FROM sync_queue WHERE status = 'pending' ORDER BY trip_id",
        )
        .fetch_all(&self.pool)
        .await?;

        trip_ids
            .into_iter()
            .map(|raw| TripId::new(raw).map_err(AppError::Database))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::sync::{OperationPayload, OperationType, Version};

    async fn setup_store() -> SqliteSyncStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        initialize_schema(&pool).await.expect("schema");
        SqliteSyncStore::new(pool)
    }

    fn draft(trip: &str, entity_id: Option<&str>) -> OperationDraft {
        OperationDraft::new(
            TripId::new(trip.to_string()).unwrap(),
            EntityType::Task,
            if entity_id.is_some() {
                OperationType::Update
            } else {
                OperationType::Create
            },
            entity_id.map(|e| EntityId::new(e.to_string()).unwrap()),
            OperationPayload::from_json_str(r#"{"title":"pack tents"}"#).unwrap(),
            entity_id.map(|_| Version::new(1).unwrap()),
        )
    }

    async fn enqueue(store: &SqliteSyncStore, trip: &str, entity_id: Option<&str>) -> QueuedOperation {
        store
            .enqueue(OperationId::generate(), draft(trip, entity_id))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_pending_preserves_enqueue_order_per_trip() {
        let store = setup_store().await;

        // Interleave two trips; each trip must still replay in its own order.
        let a1 = enqueue(&store, "trip-a", Some("t1")).await;
        let b1 = enqueue(&store, "trip-b", Some("t1")).await;
        let a2 = enqueue(&store, "trip-a", Some("t2")).await;
        let b2 = enqueue(&store, "trip-b", Some("t2")).await;
        let a3 = enqueue(&store, "trip-a", Some("t3")).await;

        let trip_a = TripId::new("trip-a".to_string()).unwrap();
        let pending: Vec<_> = store
            .list_pending(&trip_a)
            .await
            .unwrap()
            .into_iter()
            .map(|op| op.id)
            .collect();
        assert_eq!(pending, vec![a1.id, a2.id, a3.id]);

        let trip_b = TripId::new("trip-b".to_string()).unwrap();
        let pending: Vec<_> = store
            .list_pending(&trip_b)
            .await
            .unwrap()
            .into_iter()
            .map(|op| op.id)
            .collect();
        assert_eq!(pending, vec![b1.id, b2.id]);
    }

    #[tokio::test]
    async fn seq_breaks_ties_when_wall_clock_is_coarse() {
        let store = setup_store().await;

        // Enqueued back to back, these often share a millisecond timestamp.
        let mut expected = Vec::new();
        for _ in 0..10 {
            expected.push(enqueue(&store, "trip-a", None).await.id);
        }

        let trip = TripId::new("trip-a".to_string()).unwrap();
        let listed: Vec<_> = store
            .list_pending(&trip)
            .await
            .unwrap()
            .into_iter()
            .map(|op| op.id)
            .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn status_transitions_and_removal() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let op = enqueue(&store, "trip-a", Some("t1")).await;

        store
            .mark_status(&op.id, OperationStatus::Syncing)
            .await
            .unwrap();
        assert!(store.list_pending(&trip).await.unwrap().is_empty());

        store
            .mark_status(&op.id, OperationStatus::Pending)
            .await
            .unwrap();
        assert_eq!(store.list_pending(&trip).await.unwrap().len(), 1);

        store.remove(&op.id).await.unwrap();
        assert!(store.list_pending(&trip).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retry_counter_increments_and_failed_resets() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let op = enqueue(&store, "trip-a", Some("t1")).await;

        assert_eq!(store.increment_retry(&op.id).await.unwrap(), 1);
        assert_eq!(store.increment_retry(&op.id).await.unwrap(), 2);

        store
            .mark_status(&op.id, OperationStatus::Failed)
            .await
            .unwrap();
        let stats = store.queue_stats(&trip).await.unwrap();
        assert_eq!(stats.pending_count, 0);
        assert_eq!(stats.failed_count, 1);

        assert_eq!(store.reset_failed(&trip).await.unwrap(), 1);
        let listed = store.list_pending(&trip).await.unwrap();
        assert_eq!(listed.len(), 1);
        // Retry history survives a manual reset.
        assert_eq!(listed[0].retry_count, 2);
    }

    #[tokio::test]
    async fn cache_upserts_and_evicts_by_trip() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let entity_id = EntityId::new("t1".to_string()).unwrap();

        let entry = CacheEntry::new(
            EntityType::Task,
            entity_id.clone(),
            trip.clone(),
            OperationPayload::from_json_str(r#"{"title":"old"}"#).unwrap(),
            Some(Version::new(1).unwrap()),
        );
        store.put_cache(entry).await.unwrap();

        let newer = CacheEntry::new(
            EntityType::Task,
            entity_id.clone(),
            trip.clone(),
            OperationPayload::from_json_str(r#"{"title":"new"}"#).unwrap(),
            Some(Version::new(2).unwrap()),
        );
        store.put_cache(newer).await.unwrap();

        let cached = store
            .get_cache(EntityType::Task, &entity_id)
            .await
            .unwrap()
            .expect("cache entry");
        assert_eq!(cached.version, Some(Version::new(2).unwrap()));

        assert_eq!(store.evict_cache(&trip).await.unwrap(), 1);
        assert!(store
            .get_cache(EntityType::Task, &entity_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn clearing_the_cache_leaves_the_queue_alone() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let op = enqueue(&store, "trip-a", Some("t1")).await;

        let entry = CacheEntry::new(
            EntityType::Task,
            EntityId::new("t1".to_string()).unwrap(),
            trip.clone(),
            OperationPayload::from_json_str(r#"{"title":"pack tents"}"#).unwrap(),
            None,
        );
        store.put_cache(entry).await.unwrap();

        assert_eq!(store.clear_cache().await.unwrap(), 1);
        let pending = store.list_pending(&trip).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, op.id);
    }

    #[tokio::test]
    async fn trips_with_pending_lists_each_trip_once() {
        let store = setup_store().await;
        enqueue(&store, "trip-a", None).await;
        enqueue(&store, "trip-a", None).await;
        enqueue(&store, "trip-b", None).await;

        let trips = store.trips_with_pending().await.unwrap();
        assert_eq!(
            trips,
            vec![
                TripId::new("trip-a".to_string()).unwrap(),
                TripId::new("trip-b".to_string()).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn startup_recovers_operations_stranded_in_syncing() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let op = enqueue(&store, "trip-a", Some("t1")).await;
        store.increment_retry(&op.id).await.unwrap();

        // Process died while the apply call was in flight.
        store
            .mark_status(&op.id, OperationStatus::Syncing)
            .await
            .unwrap();
        assert!(store.list_pending(&trip).await.unwrap().is_empty());

        // Next start runs the schema bootstrap again.
        initialize_schema(store.pool()).await.unwrap();

        let pending = store.list_pending(&trip).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, op.id);
        assert_eq!(pending[0].retry_count, 1);
    }

    #[tokio::test]
    async fn discard_failed_only_removes_failed_operations() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();
        let op = enqueue(&store, "trip-a", Some("t1")).await;

        assert!(!store.discard_failed(&op.id).await.unwrap());
        assert_eq!(store.list_pending(&trip).await.unwrap().len(), 1);

        store
            .mark_status(&op.id, OperationStatus::Failed)
            .await
            .unwrap();
        assert!(store.discard_failed(&op.id).await.unwrap());
        assert!(store.list_failed(&trip).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store_is_a_valid_state() {
        let store = setup_store().await;
        let trip = TripId::new("trip-a".to_string()).unwrap();

        assert!(store.list_pending(&trip).await.unwrap().is_empty());
        assert_eq!(
            store.queue_stats(&trip).await.unwrap(),
            TripQueueStats::default()
        );
        assert!(store.trips_with_pending().await.unwrap().is_empty());
    }
}
