use tokio::sync::watch;

/// Observes online/offline transitions.
///
/// Only the offline -> online edge triggers an automatic sync pass; the
/// reverse edge is advisory and must never abort an in-flight apply call,
/// since cancelling mid-write risks leaving remote and local state
/// inconsistent. Listener registration is not a suspension point.
pub trait ConnectivityMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    /// Receiver observing the current state; `true` means online.
    fn watch(&self) -> watch::Receiver<bool>;
}
