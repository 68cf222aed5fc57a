pub mod cache_entry;
pub mod commands;
pub mod queue_stats;
pub mod queued_operation;
pub mod sync_report;

pub use cache_entry::CacheEntry;
pub use commands::OperationDraft;
pub use queue_stats::{SyncSnapshot, TripQueueStats, TripSyncStats};
pub use queued_operation::QueuedOperation;
pub use sync_report::SyncReport;
