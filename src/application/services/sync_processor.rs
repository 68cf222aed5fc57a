use crate::application::ports::auth::AuthProvider;
use crate::application::ports::connectivity::ConnectivityMonitor;
use crate::application::ports::handler::{ApplyError, ApplyOutcome, HandlerRegistry};
use crate::application::ports::sync_store::SyncStore;
use crate::application::services::stats::StatsPublisher;
use crate::domain::entities::sync::{CacheEntry, QueuedOperation, SyncReport, SyncSnapshot};
use crate::domain::value_objects::sync::{
    EntityId, EntityType, OperationPayload, OperationStatus, TripId,
};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Drains the offline queue when connectivity allows.
///
/// The app-wide sync coordinator: constructed once, started on foreground,
/// stopped on teardown, and passed around by injection. Trips are
/// independent partitions, so their passes run concurrently; within a trip
/// operations replay strictly in enqueue order, one apply call at a time.
pub struct SyncProcessor {
    store: Arc<dyn SyncStore>,
    registry: Arc<HandlerRegistry>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    auth: Arc<dyn AuthProvider>,
    config: SyncConfig,
    stats: StatsPublisher,
    /// One lock per trip; `try_lock` coalesces re-entrant triggers so a
    /// second "sync now" during a running pass becomes a no-op.
    trip_locks: Arc<Mutex<HashMap<TripId, Arc<Mutex<()>>>>>,
    listener: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl SyncProcessor {
    pub fn new(
        store: Arc<dyn SyncStore>,
        registry: Arc<HandlerRegistry>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        auth: Arc<dyn AuthProvider>,
        config: SyncConfig,
        stats: StatsPublisher,
    ) -> Self {
        Self {
            store,
            registry,
            connectivity,
            auth,
            config,
            stats,
            trip_locks: Arc::new(Mutex::new(HashMap::new())),
            listener: Arc::new(StdMutex::new(None)),
        }
    }

    /// Starts the connectivity listener. Kicks an immediate pass when the
    /// process is already online, then one on every offline -> online edge.
    pub fn start(&self) {
        if !self.config.auto_sync {
            tracing::info!("Auto sync disabled by configuration");
            return;
        }

        let processor = self.clone();
        let mut rx = self.connectivity.watch();
        let handle = tokio::spawn(async move {
            if *rx.borrow() {
                processor.run_sync_all().await;
            }
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                if online && !was_online {
                    processor.run_sync_all().await;
                }
                was_online = online;
            }
        });

        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = listener.replace(handle) {
            previous.abort();
        }
    }

    /// Tears the listener down. In-flight passes are not aborted; they
    /// finish their current apply and drain naturally.
    pub fn stop(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<SyncSnapshot> {
        self.stats.subscribe()
    }

    /// Manual "sync now" for a single trip.
    pub async fn sync_now(&self, trip_id: &TripId) -> Result<SyncReport, AppError> {
        self.sync_trip(trip_id).await
    }

    /// One pass over every trip with pending work, trips in parallel.
    pub async fn sync_all(&self) -> Result<Vec<SyncReport>, AppError> {
        let trips = self.store.trips_with_pending().await?;
        let mut tasks = Vec::with_capacity(trips.len());
        for trip_id in trips {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.sync_trip(&trip_id).await
            }));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(report) => reports.push(report?),
                Err(err) => {
                    return Err(AppError::Internal(format!("Sync task panicked: {err}")));
                }
            }
        }
        Ok(reports)
    }

    /// One drain pass for one trip.
    ///
    /// Operations replay in `(enqueued_at, seq)` order so the backend
    /// observes the same sequence the user produced. A retryable failure
    /// defers the operation and blocks later operations on the same entity
    /// for the rest of the pass; everything else keeps draining.
    pub async fn sync_trip(&self, trip_id: &TripId) -> Result<SyncReport, AppError> {
        let lock = self.trip_lock(trip_id).await;
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(trip_id = %trip_id, "Sync pass already running, coalescing");
                return Ok(SyncReport::coalesced(trip_id.clone()));
            }
        };

        let ops = self.store.list_pending(trip_id).await?;
        let mut report = SyncReport::empty(trip_id.clone());
        let mut blocked: HashSet<(EntityType, EntityId)> = HashSet::new();

        for op in ops {
            // Going offline mid-pass: the in-flight apply already finished,
            // just stop pulling further operations.
            if !self.connectivity.is_online() {
                tracing::info!(trip_id = %trip_id, "Went offline mid-pass, stopping drain");
                break;
            }

            let Some(handler) = self.registry.resolve(op.entity_type) else {
                // No handler: preserve the operation untouched. Not an error.
                tracing::debug!(
                    operation_id = %op.id,
                    entity_type = %op.entity_type,
                    "No handler registered, skipping"
                );
                report.skipped_count += 1;
                continue;
            };

            if let Some(key) = op.entity_key() {
                if blocked.contains(&key) {
                    // An earlier operation on this entity was deferred; a
                    // later one must not overtake it.
                    report.skipped_count += 1;
                    continue;
                }
            }

            let Some(auth) = self.auth.current() else {
                // Re-authentication may fix this; leave the rest pending
                // without consuming anyone's retry budget.
                tracing::warn!(trip_id = %trip_id, "No auth context, deferring remainder of pass");
                break;
            };

            self.store.mark_status(&op.id, OperationStatus::Syncing).await?;

            match handler.apply(&op, &auth).await {
                Ok(outcome) => {
                    self.store.remove(&op.id).await?;
                    self.refresh_cache(&op, outcome).await;
                    report.synced_count += 1;
                }
                Err(ApplyError::Retryable(reason)) => {
                    let retries = self.store.increment_retry(&op.id).await?;
                    if retries >= self.config.max_retries {
                        tracing::warn!(
                            operation_id = %op.id,
                            retries,
                            reason = %reason,
                            "Retry budget exhausted, marking failed"
                        );
                        self.store.mark_status(&op.id, OperationStatus::Failed).await?;
                        report.failed_count += 1;
                    } else {
                        tracing::debug!(
                            operation_id = %op.id,
                            retries,
                            reason = %reason,
                            "Retryable failure, deferring to next pass"
                        );
                        self.store.mark_status(&op.id, OperationStatus::Pending).await?;
                        report.deferred_count += 1;
                        if let Some(key) = op.entity_key() {
                            blocked.insert(key);
                        }
                    }
                }
                Err(ApplyError::Fatal(reason)) => {
                    tracing::error!(
                        operation_id = %op.id,
                        entity_type = %op.entity_type,
                        reason = %reason,
                        "Fatal apply failure"
                    );
                    self.store.mark_status(&op.id, OperationStatus::Failed).await?;
                    report.failed_count += 1;
                }
            }
        }

        self.stats.record_pass(self.store.as_ref(), trip_id).await?;

        tracing::info!(
            trip_id = %trip_id,
            synced = report.synced_count,
            deferred = report.deferred_count,
            failed = report.failed_count,
            skipped = report.skipped_count,
            "Sync pass finished"
        );
        Ok(report)
    }

    async fn run_sync_all(&self) {
        if let Err(err) = self.sync_all().await {
            tracing::error!(error = %err, "Sync pass failed");
        }
    }

    /// Refreshes the snapshot cache from the authoritative apply outcome.
    /// Best effort: the cache carries no correctness weight.
    async fn refresh_cache(&self, op: &QueuedOperation, outcome: ApplyOutcome) {
        let entity_id = match outcome.entity_id.clone().or_else(|| op.entity_id.clone()) {
            Some(entity_id) => entity_id,
            None => return,
        };
        let Some(payload) = outcome.payload else {
            return;
        };
        let data = match OperationPayload::new(payload) {
            Ok(data) => data,
            Err(_) => return,
        };

        let entry = CacheEntry::new(
            op.entity_type,
            entity_id,
            op.trip_id.clone(),
            data,
            outcome.version,
        );
        if let Err(err) = self.store.put_cache(entry).await {
            tracing::warn!(error = %err, "Cache refresh after sync failed");
        }
    }

    async fn trip_lock(&self, trip_id: &TripId) -> Arc<Mutex<()>> {
        let mut locks = self.trip_locks.lock().await;
        locks
            .entry(trip_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Clone for SyncProcessor {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
            connectivity: self.connectivity.clone(),
            auth: self.auth.clone(),
            config: self.config.clone(),
            stats: self.stats.clone(),
            trip_locks: self.trip_locks.clone(),
            listener: self.listener.clone(),
        }
    }
}
