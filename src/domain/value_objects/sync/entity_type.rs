use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of domain objects a queued operation can target.
///
/// Adding a new offline-writable entity means adding a variant here and
/// registering a handler for it; the sync processor itself never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    ChatMessage,
    Task,
    PollVote,
    CalendarEvent,
    /// The canonical trip meeting-point record. Offline writes to it are
    /// hard-blocked: a stale replay must never clobber a collaborator's
    /// newer value, so the enqueue path rejects it synchronously.
    Basecamp,
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::ChatMessage => "chat_message",
            EntityType::Task => "task",
            EntityType::PollVote => "poll_vote",
            EntityType::CalendarEvent => "calendar_event",
            EntityType::Basecamp => "basecamp",
        }
    }

    pub fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "chat_message" => Ok(EntityType::ChatMessage),
            "task" => Ok(EntityType::Task),
            "poll_vote" => Ok(EntityType::PollVote),
            "calendar_event" => Ok(EntityType::CalendarEvent),
            "basecamp" => Ok(EntityType::Basecamp),
            other => Err(format!("Unknown entity type: {other}")),
        }
    }

    /// Whether operations on this entity type may be queued while offline.
    pub fn offline_writable(&self) -> bool {
        !matches!(self, EntityType::Basecamp)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
