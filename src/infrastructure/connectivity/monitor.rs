use crate::application::ports::connectivity::ConnectivityMonitor;
use tokio::sync::watch;

/// Connectivity monitor fed by the host shell.
///
/// The native wrapper (or a test) reports transitions through
/// `set_online`; the engine only ever observes the resulting signal.
pub struct ChannelConnectivity {
    tx: watch::Sender<bool>,
}

impl ChannelConnectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        // send_if_modified keeps repeated reports of the same state from
        // waking listeners, so only real transitions fan out.
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }
}

impl ConnectivityMonitor for ChannelConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
