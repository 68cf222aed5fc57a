use crate::application::ports::auth::AuthContext;
use crate::application::ports::handler::{ApplyError, ApplyOutcome, EntityHandler};
use crate::application::ports::remote::{RemoteBackend, RemoteError, RemoteWrite};
use crate::domain::entities::sync::QueuedOperation;
use crate::domain::value_objects::sync::EntityType;
use crate::infrastructure::handlers::{map_remote_error, outcome_from_ack};
use async_trait::async_trait;
use std::sync::Arc;

/// Append-with-dedup policy for chat messages.
///
/// Appends do not conflict, so there is no merge logic: the operation id
/// rides along as the idempotency token and the backend's unique constraint
/// on it makes redelivery harmless. A duplicate-token rejection therefore
/// means the first delivery already won and counts as success.
pub struct ChatMessageHandler {
    backend: Arc<dyn RemoteBackend>,
}

impl ChatMessageHandler {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntityHandler for ChatMessageHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::ChatMessage
    }

    async fn apply(
        &self,
        op: &QueuedOperation,
        auth: &AuthContext,
    ) -> Result<ApplyOutcome, ApplyError> {
        let write = RemoteWrite::from_operation(op);
        match self.backend.apply_write(auth, write).await {
            Ok(ack) => Ok(outcome_from_ack(ack)),
            Err(RemoteError::DuplicateOperation) => {
                tracing::debug!(operation_id = %op.id, "Message already delivered, deduped");
                Ok(ApplyOutcome::already_applied())
            }
            Err(other) => Err(map_remote_error(other)),
        }
    }
}
