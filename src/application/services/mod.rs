pub mod queue_service;
pub mod stats;
pub mod sync_processor;

pub use queue_service::QueueService;
pub use stats::StatsPublisher;
pub use sync_processor::SyncProcessor;
