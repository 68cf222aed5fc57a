use crate::shared::error::AppError;
use sqlx::{Executor, Pool, Sqlite};

/// Creates the two local tables the engine persists: the write queue and
/// the best-effort snapshot cache, then recovers operations a previous
/// process left mid-flight. Idempotent; safe to run at every start.
pub async fn initialize_schema(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS sync_queue (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            operation_id TEXT NOT NULL UNIQUE,
            trip_id TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            operation_type TEXT NOT NULL,
            entity_id TEXT,
            payload TEXT NOT NULL,
            base_version INTEGER,
            enqueued_at INTEGER NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending'
        )
        "#,
    )
    .await?;

    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sync_queue_trip_order
        ON sync_queue (trip_id, enqueued_at, seq)
        "#,
    )
    .await?;

    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS cache (
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            trip_id TEXT NOT NULL,
            data TEXT NOT NULL,
            version INTEGER,
            cached_at INTEGER NOT NULL,
            PRIMARY KEY (entity_type, entity_id)
        )
        "#,
    )
    .await?;

    pool.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_cache_trip ON cache (trip_id)
        "#,
    )
    .await?;

    // A crash while an apply call was in flight leaves its operation stuck
    // in `syncing`, which no pass ever picks up again. Flip it back so the
    // next pass redelivers; the idempotency token keeps the redelivery from
    // producing a second remote effect.
    let recovered = pool
        .execute("UPDATE sync_queue SET status = 'pending' WHERE status = 'syncing'")
        .await?
        .rows_affected();
    if recovered > 0 {
        tracing::info!(recovered, "Recovered operations left mid-flight by a previous process");
    }

    Ok(())
}
