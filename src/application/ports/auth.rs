use serde::{Deserialize, Serialize};

/// Credentials handed to each handler for its remote calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub access_token: String,
}

/// Supplies the current user's credentials during a sync pass.
///
/// Returning `None` (absent or expired session) stops the pass; the
/// remaining operations stay pending for after re-authentication. Missing
/// auth is never a fatal outcome for a queued operation.
pub trait AuthProvider: Send + Sync {
    fn current(&self) -> Option<AuthContext>;
}
