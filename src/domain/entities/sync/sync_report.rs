use crate::domain::value_objects::sync::TripId;
use serde::{Deserialize, Serialize};

/// Outcome of one drain pass over a trip's pending queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub trip_id: TripId,
    pub synced_count: u32,
    /// Retryable failures left `pending` for the next pass.
    pub deferred_count: u32,
    pub failed_count: u32,
    /// Operations skipped untouched: no registered handler, or ordered
    /// behind an earlier failure on the same entity.
    pub skipped_count: u32,
    /// True when another pass already held the trip lock and this trigger
    /// was coalesced into a no-op.
    pub coalesced: bool,
}

impl SyncReport {
    pub fn empty(trip_id: TripId) -> Self {
        Self {
            trip_id,
            synced_count: 0,
            deferred_count: 0,
            failed_count: 0,
            skipped_count: 0,
            coalesced: false,
        }
    }

    pub fn coalesced(trip_id: TripId) -> Self {
        Self {
            coalesced: true,
            ..Self::empty(trip_id)
        }
    }
}
