use crate::domain::entities::sync::{CacheEntry, QueuedOperation};
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationPayload, OperationStatus, OperationType, TripId,
    Version,
};
use crate::infrastructure::database::rows::{CacheRow, SyncQueueRow};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};

fn datetime_from_millis(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Database(format!("Timestamp out of range: {millis}")))
}

fn corrupt(column: &str, err: String) -> AppError {
    AppError::Database(format!("Corrupt {column} column: {err}"))
}

pub fn queued_operation_from_row(row: SyncQueueRow) -> Result<QueuedOperation, AppError> {
    let entity_id = row
        .entity_id
        .map(|raw| EntityId::new(raw).map_err(|e| corrupt("entity_id", e)))
        .transpose()?;
    let base_version = row
        .base_version
        .map(|raw| Version::new(raw).map_err(|e| corrupt("base_version", e)))
        .transpose()?;

    Ok(QueuedOperation {
        id: OperationId::new(row.operation_id).map_err(|e| corrupt("operation_id", e))?,
        seq: row.seq,
        trip_id: TripId::new(row.trip_id).map_err(|e| corrupt("trip_id", e))?,
        entity_type: EntityType::from_str(&row.entity_type)
            .map_err(|e| corrupt("entity_type", e))?,
        operation_type: OperationType::from_str(&row.operation_type)
            .map_err(|e| corrupt("operation_type", e))?,
        entity_id,
        payload: OperationPayload::from_json_str(&row.payload)
            .map_err(|e| corrupt("payload", e))?,
        base_version,
        enqueued_at: datetime_from_millis(row.enqueued_at)?,
        retry_count: u32::try_from(row.retry_count)
            .map_err(|_| corrupt("retry_count", "negative value".to_string()))?,
        status: OperationStatus::from_str(&row.status).map_err(|e| corrupt("status", e))?,
    })
}

pub fn cache_entry_from_row(row: CacheRow) -> Result<CacheEntry, AppError> {
    let version = row
        .version
        .map(|raw| Version::new(raw).map_err(|e| corrupt("version", e)))
        .transpose()?;

    Ok(CacheEntry {
        entity_type: EntityType::from_str(&row.entity_type)
            .map_err(|e| corrupt("entity_type", e))?,
        entity_id: EntityId::new(row.entity_id).map_err(|e| corrupt("entity_id", e))?,
        trip_id: TripId::new(row.trip_id).map_err(|e| corrupt("trip_id", e))?,
        data: OperationPayload::from_json_str(&row.data).map_err(|e| corrupt("data", e))?,
        version,
        cached_at: datetime_from_millis(row.cached_at)?,
    })
}
