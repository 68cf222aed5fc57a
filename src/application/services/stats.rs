use crate::application::ports::sync_store::SyncStore;
use crate::domain::entities::sync::{SyncSnapshot, TripSyncStats};
use crate::domain::value_objects::sync::TripId;
use crate::shared::error::AppError;
use chrono::Utc;
use tokio::sync::watch;

/// Push-updated view of per-trip queue health for the banner UI.
///
/// Counts are always re-read from the durable store after a state change;
/// only `last_synced_at` lives in memory.
#[derive(Clone)]
pub struct StatsPublisher {
    tx: watch::Sender<SyncSnapshot>,
}

impl StatsPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.tx.subscribe()
    }

    /// Re-reads the trip's counts from the store and publishes them.
    pub async fn refresh(
        &self,
        store: &dyn SyncStore,
        trip_id: &TripId,
    ) -> Result<(), AppError> {
        let counts = store.queue_stats(trip_id).await?;
        self.tx.send_modify(|snapshot| {
            let stats = snapshot.trips.entry(trip_id.clone()).or_default();
            stats.pending_count = counts.pending_count;
            stats.failed_count = counts.failed_count;
        });
        Ok(())
    }

    /// Same as `refresh`, additionally stamping the end of a sync pass.
    pub async fn record_pass(
        &self,
        store: &dyn SyncStore,
        trip_id: &TripId,
    ) -> Result<(), AppError> {
        let counts = store.queue_stats(trip_id).await?;
        let now = Utc::now();
        self.tx.send_modify(|snapshot| {
            snapshot.trips.insert(
                trip_id.clone(),
                TripSyncStats {
                    pending_count: counts.pending_count,
                    failed_count: counts.failed_count,
                    last_synced_at: Some(now),
                },
            );
        });
        Ok(())
    }
}

impl Default for StatsPublisher {
    fn default() -> Self {
        Self::new()
    }
}
