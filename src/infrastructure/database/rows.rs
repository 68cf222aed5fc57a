use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncQueueRow {
    pub seq: i64,
    pub operation_id: String,
    pub trip_id: String,
    pub entity_type: String,
    pub operation_type: String,
    pub entity_id: Option<String>,
    pub payload: String,
    pub base_version: Option<i64>,
    pub enqueued_at: i64,
    pub retry_count: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheRow {
    pub entity_type: String,
    pub entity_id: String,
    pub trip_id: String,
    pub data: String,
    pub version: Option<i64>,
    pub cached_at: i64,
}
