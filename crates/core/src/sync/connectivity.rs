//! Host-fed connectivity state.

use log::info;
use tokio::sync::watch;

/// Connectivity as seen by watchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
    /// Number of offline-to-online transitions so far. Lets a watcher that
    /// missed an intermediate offline blip still see that a reconnect
    /// happened.
    pub reconnects: u64,
}

/// Tracks whether the collector is reachable.
///
/// The host environment reports transitions through [`set_online`]; the
/// scheduler watches them to fire a batch once per offline-to-online change.
///
/// [`set_online`]: ConnectivityMonitor::set_online
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: watch::Sender<ConnectivityState>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (sender, _) = watch::channel(ConnectivityState {
            online: initially_online,
            reconnects: 0,
        });
        Self { sender }
    }

    pub fn is_online(&self) -> bool {
        self.sender.borrow().online
    }

    pub fn state(&self) -> ConnectivityState {
        *self.sender.borrow()
    }

    /// Records the current state. Returns true if this was a transition.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if current.online == online {
                return false;
            }
            current.online = online;
            if online {
                current.reconnects += 1;
            }
            true
        });
        if changed {
            info!(
                "[Connectivity] {}",
                if online {
                    "became online"
                } else {
                    "became offline"
                }
            );
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.sender.subscribe()
    }
}
