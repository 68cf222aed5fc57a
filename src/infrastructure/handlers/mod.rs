pub mod chat_message;
pub mod lww;
pub mod poll_vote;
pub mod task;

pub use chat_message::ChatMessageHandler;
pub use poll_vote::PollVoteHandler;
pub use task::TaskHandler;

use crate::application::ports::handler::{ApplyError, ApplyOutcome};
use crate::application::ports::remote::{RemoteAck, RemoteError};

/// Maps backend outcomes onto the processor's three-way taxonomy. Duplicate
/// tokens and version conflicts are intercepted by the policy code before
/// this runs.
pub(crate) fn map_remote_error(err: RemoteError) -> ApplyError {
    match err {
        RemoteError::Transient(msg) => ApplyError::Retryable(msg),
        RemoteError::DuplicateOperation => ApplyError::Retryable(err.to_string()),
        RemoteError::VersionConflict { .. } => ApplyError::Retryable(err.to_string()),
        RemoteError::PermissionDenied(msg) => ApplyError::Fatal(msg),
        RemoteError::EntityGone(msg) => ApplyError::Fatal(msg),
        RemoteError::InvalidPayload(msg) => ApplyError::Fatal(msg),
    }
}

pub(crate) fn outcome_from_ack(ack: RemoteAck) -> ApplyOutcome {
    ApplyOutcome {
        entity_id: ack.entity_id,
        version: ack.version,
        payload: ack.payload,
    }
}
