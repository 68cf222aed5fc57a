//! Offline write queue and synchronization engine for the Waypoint trip
//! client.
//!
//! A trip-collaboration client keeps working while disconnected: user
//! actions are queued in a local durable store and optimistically cached,
//! then replayed against the shared backend in order once connectivity
//! returns. Per-entity conflict policies (append-with-dedup, last-write-wins
//! with a version fence, hard-block) decide how a replay reconciles with
//! other collaborators' writes without silently destroying them.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::auth::{AuthContext, AuthProvider};
pub use application::ports::connectivity::ConnectivityMonitor;
pub use application::ports::handler::{
    ApplyError, ApplyOutcome, EntityHandler, HandlerRegistry,
};
pub use application::ports::remote::{RemoteAck, RemoteBackend, RemoteError, RemoteWrite};
pub use application::ports::sync_store::SyncStore;
pub use application::services::{QueueService, StatsPublisher, SyncProcessor};
pub use domain::entities::sync::{
    CacheEntry, OperationDraft, QueuedOperation, SyncReport, SyncSnapshot, TripQueueStats,
    TripSyncStats,
};
pub use domain::value_objects::sync::{
    EntityId, EntityType, OperationId, OperationPayload, OperationStatus, OperationType, TripId,
    Version,
};
pub use infrastructure::connectivity::ChannelConnectivity;
pub use infrastructure::database::{initialize_schema, SqliteSyncStore};
pub use infrastructure::handlers::{ChatMessageHandler, PollVoteHandler, TaskHandler};
pub use shared::config::{AppConfig, DatabaseConfig, SyncConfig};
pub use shared::error::AppError;

/// Initialize tracing output. Call once at process start.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypoint_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
