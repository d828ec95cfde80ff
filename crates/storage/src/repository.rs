use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::path::StorePath;
use crate::subscription::{SnapshotCallback, SubscriberRegistry, Subscription, deliver};
use crate::tree;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Multi-path write applied atomically by [`ActivityStore::update`].
pub type PathUpdate = BTreeMap<StorePath, Value>;

/// The hierarchical activity store.
///
/// Writing `null` (or a value with nothing left after dropping nulls and
/// empty objects) deletes the addressed node, and parents left empty are
/// pruned.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Snapshot at `path`, or `None` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StorageError>;

    /// Replaces the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StorageError>;

    /// Writes every entry or none of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if two entries overlap, or other storage errors.
    async fn update(&self, updates: PathUpdate) -> Result<(), StorageError>;

    /// Deletes the node at `path`. Removing a missing node is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn remove(&self, path: &StorePath) -> Result<(), StorageError> {
        self.set(path, Value::Null).await
    }

    /// Calls `callback` with the current snapshot, then again after every write
    /// that touches `path`, an ancestor or a descendant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the initial snapshot cannot be read.
    async fn subscribe(
        &self,
        path: &StorePath,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StorageError>;
}

/// Rejects updates where one path lies inside another.
///
/// # Errors
///
/// Returns `StorageError::Conflict` naming the first overlapping pair.
pub fn check_disjoint(updates: &PathUpdate) -> Result<(), StorageError> {
    // Sorted order puts an ancestor directly before its first descendant.
    let paths: Vec<&StorePath> = updates.keys().collect();
    for pair in paths.windows(2) {
        if pair[0].overlaps(pair[1]) {
            return Err(StorageError::Conflict(format!(
                "update paths overlap: {} and {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

/// Simple in-memory store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    root: Arc<Mutex<Value>>,
    subscribers: SubscriberRegistry,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, updates: PathUpdate) -> Result<(), StorageError> {
        let written: Vec<StorePath> = updates.keys().cloned().collect();
        let deliveries = {
            let mut root = self
                .root
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            for (path, value) in updates {
                tree::set_at(&mut root, path.segments(), value);
            }
            self.subscribers
                .affected(&written)?
                .into_iter()
                .map(|(path, callback)| {
                    (callback, tree::get_at(&root, path.segments()).cloned())
                })
                .collect::<Vec<_>>()
        };
        tracing::debug!(paths = written.len(), "in-memory write");
        deliver(deliveries);
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StorageError> {
        let root = self
            .root
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(tree::get_at(&root, path.segments()).cloned())
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StorageError> {
        self.write(PathUpdate::from([(path.clone(), value)]))
    }

    async fn update(&self, updates: PathUpdate) -> Result<(), StorageError> {
        check_disjoint(&updates)?;
        self.write(updates)
    }

    async fn subscribe(
        &self,
        path: &StorePath,
        callback: SnapshotCallback,
    ) -> Result<Subscription, StorageError> {
        let subscription = self.subscribers.register(path.clone(), Arc::clone(&callback))?;
        let initial = self.get(path).await?;
        deliver(vec![(callback, initial)]);
        Ok(subscription)
    }
}

/// The activity store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub activity: Arc<dyn ActivityStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            activity: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn set_get_and_prune() {
        let store = InMemoryStore::new();
        store.set(&path("users/u1/tracker/2024/0/day1/a"), json!(true)).await.unwrap();
        store.set(&path("users/u1/username"), json!("sam")).await.unwrap();

        let day = store.get(&path("users/u1/tracker/2024/0/day1")).await.unwrap();
        assert_eq!(day, Some(json!({ "a": true })));

        store.remove(&path("users/u1/tracker/2024/0/day1/a")).await.unwrap();
        assert_eq!(store.get(&path("users/u1/tracker")).await.unwrap(), None);
        assert_eq!(store.get(&path("users/u1")).await.unwrap(), Some(json!({ "username": "sam" })));
    }

    #[tokio::test]
    async fn update_applies_every_entry() {
        let store = InMemoryStore::new();
        store.set(&path("d"), json!({ "a": true, "b": true })).await.unwrap();
        let updates = PathUpdate::from([
            (path("d/a"), Value::Null),
            (path("d/c"), json!(false)),
        ]);
        store.update(updates).await.unwrap();
        assert_eq!(store.get(&path("d")).await.unwrap(), Some(json!({ "b": true, "c": false })));
    }

    #[tokio::test]
    async fn overlapping_update_is_rejected_untouched() {
        let store = InMemoryStore::new();
        store.set(&path("d/a"), json!(true)).await.unwrap();
        let updates = PathUpdate::from([(path("d"), json!({ "x": 1 })), (path("d/a"), json!(false))]);
        assert!(matches!(store.update(updates).await, Err(StorageError::Conflict(_))));
        assert_eq!(store.get(&path("d")).await.unwrap(), Some(json!({ "a": true })));
    }

    #[tokio::test]
    async fn subscribers_get_initial_and_full_snapshots() {
        let store = InMemoryStore::new();
        store.set(&path("m/day1/a"), json!(true)).await.unwrap();

        let seen: Arc<StdMutex<Vec<Option<Value>>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let sub = store
            .subscribe(&path("m"), Arc::new(move |snapshot| sink.lock().unwrap().push(snapshot)))
            .await
            .unwrap();

        store.set(&path("m/day2/b"), json!(false)).await.unwrap();
        store.set(&path("other"), json!(1)).await.unwrap();
        store.remove(&path("m")).await.unwrap();
        drop(sub);
        store.set(&path("m/day3/c"), json!(true)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Some(json!({ "day1": { "a": true } })),
                Some(json!({ "day1": { "a": true }, "day2": { "b": false } })),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn arrays_read_back_as_index_keyed_objects() {
        let store = InMemoryStore::new();
        store
            .set(&path("users/u1/tracker/2024"), json!([{ "day1": { "a": true } }, null, { "day3": { "b": false } }]))
            .await
            .unwrap();
        assert_eq!(
            store.get(&path("users/u1/tracker/2024")).await.unwrap(),
            Some(json!({ "0": { "day1": { "a": true } }, "2": { "day3": { "b": false } } }))
        );
    }

    #[test]
    fn disjoint_check_spots_nested_paths() {
        let ok = PathUpdate::from([(path("a/b"), json!(1)), (path("a/bc"), json!(1))]);
        assert!(check_disjoint(&ok).is_ok());
        let nested = PathUpdate::from([(path("a"), json!(1)), (path("a/b/c"), json!(1))]);
        assert!(check_disjoint(&nested).is_err());
    }
}
