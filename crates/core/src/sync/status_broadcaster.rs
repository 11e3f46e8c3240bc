//! Observer list publishing [`SyncStatus`] snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use super::report_sync_model::SyncStatus;

/// Callback invoked with every new status snapshot.
pub type StatusListener = Arc<dyn Fn(&SyncStatus) + Send + Sync>;

struct BroadcasterInner {
    /// Held across "change, then notify" so listeners see updates in the
    /// order they were applied.
    publish: Mutex<()>,
    status: RwLock<SyncStatus>,
    listeners: Mutex<Vec<(u64, StatusListener)>>,
    next_id: AtomicU64,
}

impl BroadcasterInner {
    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, StatusListener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish_guard(&self) -> MutexGuard<'_, ()> {
        self.publish
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: u64) {
        self.listeners().retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Holds the current [`SyncStatus`] and fans out changes to listeners.
///
/// Listeners run synchronously on the thread that changed the status. Updates
/// are serialized, so every listener sees snapshots in the order they were
/// applied. A listener may read the broadcaster or drop its subscription,
/// but must not call [`update`](StatusBroadcaster::update) itself.
#[derive(Clone)]
pub struct StatusBroadcaster {
    inner: Arc<BroadcasterInner>,
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                publish: Mutex::new(()),
                status: RwLock::new(SyncStatus::default()),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Current status snapshot.
    pub fn snapshot(&self) -> SyncStatus {
        self.inner
            .status
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Registers `listener` and immediately calls it with the current status.
    pub fn subscribe<F>(&self, listener: F) -> StatusSubscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener: StatusListener = Arc::new(listener);
        {
            let _publish = self.inner.publish_guard();
            self.inner.listeners().push((id, Arc::clone(&listener)));
            listener(&self.snapshot());
        }

        StatusSubscription {
            id,
            broadcaster: Arc::downgrade(&self.inner),
        }
    }

    /// Applies `change` to the status and notifies every listener.
    ///
    /// `change` runs while concurrent updates are held off, so values it
    /// reads (such as a fresh pending count) cannot be published out of
    /// order.
    pub fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut SyncStatus),
    {
        let _publish = self.inner.publish_guard();
        let snapshot = {
            let mut status = self
                .inner
                .status
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            change(&mut status);
            status.clone()
        };
        self.notify(&snapshot);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }

    fn notify(&self, snapshot: &SyncStatus) {
        let listeners: Vec<StatusListener> = self
            .inner
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Handle for one registered listener. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct StatusSubscription {
    id: u64,
    broadcaster: Weak<BroadcasterInner>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.broadcaster.upgrade() {
            inner.remove(self.id);
        }
    }
}
