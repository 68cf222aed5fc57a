use crate::application::ports::auth::AuthContext;
use crate::application::ports::handler::{ApplyError, ApplyOutcome, EntityHandler};
use crate::application::ports::remote::RemoteBackend;
use crate::domain::entities::sync::QueuedOperation;
use crate::domain::value_objects::sync::EntityType;
use crate::infrastructure::handlers::lww::apply_with_version_fence;
use async_trait::async_trait;
use std::sync::Arc;

/// Task completion and edits replay under last-write-wins with a version
/// fence.
pub struct TaskHandler {
    backend: Arc<dyn RemoteBackend>,
}

impl TaskHandler {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntityHandler for TaskHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Task
    }

    async fn apply(
        &self,
        op: &QueuedOperation,
        auth: &AuthContext,
    ) -> Result<ApplyOutcome, ApplyError> {
        apply_with_version_fence(self.backend.as_ref(), op, auth).await
    }
}
