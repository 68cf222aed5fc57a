use crate::application::ports::auth::AuthContext;
use crate::domain::entities::sync::QueuedOperation;
use crate::domain::value_objects::sync::{EntityId, EntityType, Version};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Result of a successful apply, carrying the authoritative post-write
/// state so the processor can refresh the local cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub entity_id: Option<EntityId>,
    pub version: Option<Version>,
    pub payload: Option<Value>,
}

impl ApplyOutcome {
    /// Outcome for a redelivered operation whose first delivery already
    /// took effect remotely. Nothing to refresh locally.
    pub fn already_applied() -> Self {
        Self::default()
    }
}

/// Three-way apply outcome, returned as a value rather than thrown:
/// retryable failure is routine control flow here, not an exceptional case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    /// Transient condition; the operation returns to `pending` and is
    /// eligible for the next pass.
    #[error("Retryable: {0}")]
    Retryable(String),

    /// Permanent rejection; the operation moves to `failed` and waits for
    /// explicit user action, never an automatic retry.
    #[error("Fatal: {0}")]
    Fatal(String),
}

/// Knows how to replay one entity type's operations against the backend,
/// consulting that type's conflict policy before mutating remote state.
/// Timeouts on the underlying network call belong to the handler, not the
/// processor.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    fn entity_type(&self) -> EntityType;

    async fn apply(
        &self,
        op: &QueuedOperation,
        auth: &AuthContext,
    ) -> Result<ApplyOutcome, ApplyError>;
}

/// Maps entity-type tags to their handlers.
///
/// Keyed by `handler.entity_type()`, so a handler can never be registered
/// under the wrong tag. New entity types are added purely by registering a
/// handler here; the sync processor never changes. An unresolved tag is a
/// deliberate no-op for the processor, never an error.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EntityType, Arc<dyn EntityHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn EntityHandler>) {
        let entity_type = handler.entity_type();
        if self.handlers.insert(entity_type, handler).is_some() {
            tracing::warn!(entity_type = %entity_type, "Replaced existing handler");
        }
    }

    /// Builder-style registration for wiring at startup.
    pub fn with_handler(mut self, handler: Arc<dyn EntityHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn resolve(&self, entity_type: EntityType) -> Option<Arc<dyn EntityHandler>> {
        self.handlers.get(&entity_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<EntityType> {
        self.handlers.keys().copied().collect()
    }
}
