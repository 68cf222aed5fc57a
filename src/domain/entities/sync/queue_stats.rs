use crate::domain::value_objects::sync::TripId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Durable counts for one trip, always re-read from the store so the UI
/// never drifts from persisted truth.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct TripQueueStats {
    pub pending_count: u32,
    pub failed_count: u32,
}

/// Per-trip view pushed to the banner/indicator UI.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TripSyncStats {
    pub pending_count: u32,
    pub failed_count: u32,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Snapshot of every observed trip, published over a watch channel.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SyncSnapshot {
    pub trips: HashMap<TripId, TripSyncStats>,
}

impl SyncSnapshot {
    pub fn trip(&self, trip_id: &TripId) -> TripSyncStats {
        self.trips.get(trip_id).cloned().unwrap_or_default()
    }
}
