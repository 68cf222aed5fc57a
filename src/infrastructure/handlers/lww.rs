use crate::application::ports::auth::AuthContext;
use crate::application::ports::handler::{ApplyError, ApplyOutcome};
use crate::application::ports::remote::{RemoteBackend, RemoteError, RemoteWrite};
use crate::domain::entities::sync::QueuedOperation;
use crate::infrastructure::handlers::{map_remote_error, outcome_from_ack};

/// Last-write-wins replay with a version fence, shared by the task and
/// poll-vote handlers.
///
/// The fence is checked before the write: if the queued operation's assumed
/// base version is stale, the write goes out once against the refreshed
/// version instead of failing outright. A conflict that survives that single
/// refreshed attempt is fatal: the operation is surfaced, never silently
/// dropped and never blindly forced over a collaborator's newer value.
pub(crate) async fn apply_with_version_fence(
    backend: &dyn RemoteBackend,
    op: &QueuedOperation,
    auth: &AuthContext,
) -> Result<ApplyOutcome, ApplyError> {
    let mut write = RemoteWrite::from_operation(op);
    let mut refreshed = false;

    if let Some(entity_id) = &op.entity_id {
        let current = backend
            .fetch_version(auth, &op.trip_id, op.entity_type, entity_id)
            .await
            .map_err(map_remote_error)?;
        if current != op.base_version {
            tracing::debug!(
                operation_id = %op.id,
                assumed = ?op.base_version,
                current = ?current,
                "Base version is stale, replaying against refreshed version"
            );
            write.expected_version = current;
            refreshed = true;
        }
    }

    match backend.apply_write(auth, write.clone()).await {
        Ok(ack) => Ok(outcome_from_ack(ack)),
        Err(RemoteError::DuplicateOperation) => Ok(ApplyOutcome::already_applied()),
        Err(RemoteError::VersionConflict { current }) if !refreshed => {
            // Remote moved between the fence check and the write; one more
            // attempt against the version the backend reported.
            write.expected_version = Some(current);
            match backend.apply_write(auth, write).await {
                Ok(ack) => Ok(outcome_from_ack(ack)),
                Err(RemoteError::DuplicateOperation) => Ok(ApplyOutcome::already_applied()),
                Err(RemoteError::VersionConflict { .. }) => Err(ApplyError::Fatal(
                    "Version conflict persisted after refreshed retry".to_string(),
                )),
                Err(other) => Err(map_remote_error(other)),
            }
        }
        Err(RemoteError::VersionConflict { .. }) => Err(ApplyError::Fatal(
            "Version conflict persisted after refreshed retry".to_string(),
        )),
        Err(other) => Err(map_remote_error(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::remote::RemoteAck;
    use crate::domain::value_objects::sync::{
        EntityId, EntityType, OperationId, OperationPayload, OperationStatus, OperationType,
        TripId, Version,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Versioned backend that rejects writes not fenced at its current
    /// version.
    struct VersionedBackend {
        version: Mutex<i64>,
        apply_calls: AtomicU32,
        fetch_calls: AtomicU32,
        /// When set, every write conflicts regardless of the fence.
        always_conflict: bool,
    }

    impl VersionedBackend {
        fn at(version: i64) -> Self {
            Self {
                version: Mutex::new(version),
                apply_calls: AtomicU32::new(0),
                fetch_calls: AtomicU32::new(0),
                always_conflict: false,
            }
        }

        fn conflicting(version: i64) -> Self {
            Self {
                always_conflict: true,
                ..Self::at(version)
            }
        }
    }

    #[async_trait]
    impl RemoteBackend for VersionedBackend {
        async fn apply_write(
            &self,
            _auth: &AuthContext,
            write: RemoteWrite,
        ) -> Result<RemoteAck, RemoteError> {
            self.apply_calls.fetch_add(1, Ordering::SeqCst);
            let mut version = self.version.lock().unwrap();
            let current = Version::new(*version).unwrap();

            if self.always_conflict || write.expected_version != Some(current) {
                return Err(RemoteError::VersionConflict { current });
            }

            *version += 1;
            Ok(RemoteAck {
                entity_id: write.entity_id,
                version: Some(Version::new(*version).unwrap()),
                payload: Some(write.payload),
            })
        }

        async fn fetch_version(
            &self,
            _auth: &AuthContext,
            _trip_id: &TripId,
            _entity_type: EntityType,
            _entity_id: &EntityId,
        ) -> Result<Option<Version>, RemoteError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Version::new(*self.version.lock().unwrap()).unwrap()))
        }
    }

    fn update_operation(base_version: i64) -> QueuedOperation {
        QueuedOperation {
            id: OperationId::generate(),
            seq: 1,
            trip_id: TripId::new("trip-a".to_string()).unwrap(),
            entity_type: EntityType::Task,
            operation_type: OperationType::Update,
            entity_id: Some(EntityId::new("task-1".to_string()).unwrap()),
            payload: OperationPayload::from_json_str(r#"{"completed":true}"#).unwrap(),
            base_version: Some(Version::new(base_version).unwrap()),
            enqueued_at: Utc::now(),
            retry_count: 0,
            status: OperationStatus::Pending,
        }
    }

    fn auth() -> AuthContext {
        AuthContext {
            user_id: "user-1".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn fresh_base_version_applies_directly() {
        let backend = VersionedBackend::at(1);
        let op = update_operation(1);

        let outcome = apply_with_version_fence(&backend, &op, &auth())
            .await
            .unwrap();

        assert_eq!(outcome.version, Some(Version::new(2).unwrap()));
        assert_eq!(backend.apply_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_base_version_is_retried_once_against_refreshed_version() {
        // Remote moved to 3 while the operation sat in the queue at base 1.
        let backend = VersionedBackend::at(3);
        let op = update_operation(1);

        let outcome = apply_with_version_fence(&backend, &op, &auth())
            .await
            .unwrap();

        assert_eq!(outcome.version, Some(Version::new(4).unwrap()));
        assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.apply_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistent_conflict_is_fatal_after_one_bounded_retry() {
        let backend = VersionedBackend::conflicting(1);
        let op = update_operation(1);

        let result = apply_with_version_fence(&backend, &op, &auth()).await;

        assert!(matches!(result, Err(ApplyError::Fatal(_))));
        // First attempt plus exactly one refreshed retry, never unbounded.
        assert_eq!(backend.apply_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conflict_after_stale_fence_refresh_is_fatal_without_more_retries() {
        let backend = VersionedBackend::conflicting(5);
        let op = update_operation(1);

        let result = apply_with_version_fence(&backend, &op, &auth()).await;

        assert!(matches!(result, Err(ApplyError::Fatal(_))));
        // The fence already refreshed before the write, so the single
        // conflicting attempt is final.
        assert_eq!(backend.apply_calls.load(Ordering::SeqCst), 1);
    }
}
