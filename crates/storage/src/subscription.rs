use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

use crate::path::StorePath;
use crate::repository::StorageError;

/// Receives the full snapshot at the subscribed path; `None` when the node is gone.
pub type SnapshotCallback = Arc<dyn Fn(Option<Value>) + Send + Sync>;

struct Subscriber {
    id: u64,
    path: StorePath,
    callback: SnapshotCallback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Listeners keyed by path, shared by a store and the handles it hands out.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. It stays registered until the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the registry lock is poisoned.
    pub fn register(
        &self,
        path: StorePath,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StorageError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.next_id;
        guard.next_id += 1;
        guard.subscribers.push(Subscriber {
            id,
            path: path.clone(),
            callback,
        });
        Ok(Subscription {
            id,
            path,
            registry: Arc::downgrade(&self.inner),
        })
    }

    /// Listeners whose path overlaps any of `written`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the registry lock is poisoned.
    pub fn affected(
        &self,
        written: &[StorePath],
    ) -> Result<Vec<(StorePath, SnapshotCallback)>, StorageError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .subscribers
            .iter()
            .filter(|sub| written.iter().any(|path| path.overlaps(&sub.path)))
            .map(|sub| (sub.path.clone(), Arc::clone(&sub.callback)))
            .collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|guard| guard.subscribers.len())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Invokes each callback with its snapshot. Must be called without any store lock held.
pub fn deliver(deliveries: Vec<(SnapshotCallback, Option<Value>)>) {
    if !deliveries.is_empty() {
        tracing::debug!(count = deliveries.len(), "delivering snapshots");
    }
    for (callback, snapshot) in deliveries {
        callback(snapshot);
    }
}

/// Handle for a live listener. Dropping it detaches the listener.
#[must_use = "dropping a subscription detaches it immediately"]
pub struct Subscription {
    id: u64,
    path: StorePath,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    #[must_use]
    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Ok(mut guard) = registry.lock() {
            guard.subscribers.retain(|sub| sub.id != self.id);
        }
    }
}
