//! In-memory raw subscription map backed by per-subscription files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subs_model::RawSubscription;
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::error::Result;
use crate::io::{save_subscription_async, scan_subscriptions_async};

/// Snapshot of every loaded subscription, keyed by id.
pub type SubscriptionMap = BTreeMap<i64, Arc<RawSubscription>>;

/// Authoritative owner of parsed subscription documents.
///
/// Every mutation that also touches the backing files runs under one
/// store-wide async lock, so local edits, the cold-start load and remote
/// update checks never interleave. Take the lock with [`lock`](Self::lock)
/// to perform several reads and writes as one critical section.
#[derive(Debug)]
pub struct RawSubscriptionStore {
    dir: PathBuf,
    lock: Mutex<()>,
    map: watch::Sender<Arc<SubscriptionMap>>,
}

impl RawSubscriptionStore {
    /// Create an empty store whose files live in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
            map: watch::Sender::new(Arc::new(SubscriptionMap::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current map snapshot.
    pub fn snapshot(&self) -> Arc<SubscriptionMap> {
        Arc::clone(&self.map.borrow())
    }

    pub fn get(&self, id: i64) -> Option<Arc<RawSubscription>> {
        self.map.borrow().get(&id).cloned()
    }

    /// Observe the map; the receiver is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SubscriptionMap>> {
        self.map.subscribe()
    }

    /// Acquire the store-wide mutation lock.
    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            store: self,
            _guard: self.lock.lock().await,
        }
    }

    /// Insert or replace a document and persist it. See [`StoreGuard::upsert`].
    pub async fn upsert(&self, subscription: RawSubscription) -> Result<Arc<RawSubscription>> {
        self.lock().await.upsert(subscription).await
    }

    /// Drop a document from the in-memory map. The file is left alone.
    pub async fn remove(&self, id: i64) -> Option<Arc<RawSubscription>> {
        self.lock().await.remove(id)
    }

    /// Seed the map from every `<id>.json` file in the store directory.
    ///
    /// Corrupt files are skipped. Returns the number of documents loaded.
    pub async fn load_all(&self) -> Result<usize> {
        let _guard = self.lock().await;
        let loaded = scan_subscriptions_async(self.dir.clone()).await?;
        let count = loaded.len();
        let map: SubscriptionMap = loaded
            .into_iter()
            .map(|subscription| (subscription.id, Arc::new(subscription)))
            .collect();
        self.map.send_replace(Arc::new(map));
        Ok(count)
    }

    fn publish(&self, id: i64, value: Option<Arc<RawSubscription>>) -> Option<Arc<RawSubscription>> {
        let mut previous = None;
        self.map.send_if_modified(|map| {
            let map = Arc::make_mut(map);
            previous = match &value {
                Some(subscription) => map.insert(id, Arc::clone(subscription)),
                None => map.remove(&id),
            };
            value.is_some() || previous.is_some()
        });
        previous
    }
}

/// Exclusive access to a [`RawSubscriptionStore`] for the guard's lifetime.
pub struct StoreGuard<'a> {
    store: &'a RawSubscriptionStore,
    _guard: MutexGuard<'a, ()>,
}

impl StoreGuard<'_> {
    pub fn get(&self, id: i64) -> Option<Arc<RawSubscription>> {
        self.store.get(id)
    }

    /// Insert or replace a document, then write it to `<id>.json`.
    ///
    /// A local document (negative id) arriving with the same version as the
    /// stored one is a self-edit: its version is bumped by one before storing
    /// so edits never collide on a version number.
    ///
    /// The map is updated before the write. If the write fails the previous
    /// entry is restored (or the new one dropped) before the error is
    /// returned, so the map never holds a document the disk does not.
    pub async fn upsert(&mut self, mut subscription: RawSubscription) -> Result<Arc<RawSubscription>> {
        let id = subscription.id;
        let current = self.store.get(id);
        if subscription.is_local()
            && current
                .as_ref()
                .is_some_and(|c| c.version == subscription.version)
        {
            subscription.version += 1;
            tracing::debug!(subs_id = id, version = subscription.version, "Bumped local version");
        }

        let subscription = Arc::new(subscription);
        let previous = self.store.publish(id, Some(Arc::clone(&subscription)));

        match save_subscription_async(self.store.dir.clone(), Arc::clone(&subscription)).await {
            Ok(_) => {
                tracing::info!(
                    subs_id = id,
                    version = subscription.version,
                    "Stored subscription {}",
                    subscription.name
                );
                Ok(subscription)
            }
            Err(e) => {
                tracing::error!(subs_id = id, "Failed to persist subscription: {e}");
                self.store.publish(id, previous);
                Err(e)
            }
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<Arc<RawSubscription>> {
        let removed = self.store.publish(id, None);
        if removed.is_some() {
            tracing::info!(subs_id = id, "Removed subscription from memory");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save_subscription;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upsert_writes_file_and_publishes() {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        let mut rx = store.subscribe();

        store.upsert(RawSubscription::new(4, "Remote", 2)).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().get(&4).unwrap().version, 2);
        assert!(dir.path().join("4.json").exists());
    }

    #[tokio::test]
    async fn test_local_self_edit_bumps_version() {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        store.upsert(RawSubscription::new(-1, "Local", 1)).await.unwrap();

        let mut edit = RawSubscription::new(-1, "Local (edited)", 1);
        edit.author = Some("me".to_string());
        let stored = store.upsert(edit).await.unwrap();

        assert_eq!(stored.version, 2);
        assert_eq!(stored.name, "Local (edited)");
        assert_eq!(stored.author.as_deref(), Some("me"));
        assert_eq!(store.get(-1).unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_remote_same_version_is_not_bumped() {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        store.upsert(RawSubscription::new(8, "Remote", 3)).await.unwrap();
        let stored = store.upsert(RawSubscription::new(8, "Remote", 3)).await.unwrap();
        assert_eq!(stored.version, 3);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        // A plain file where the directory should be makes every write fail.
        let blocker = dir.path().join("subscriptions");
        fs::write(&blocker, b"").unwrap();
        let store = RawSubscriptionStore::new(&blocker);

        let result = store.upsert(RawSubscription::new(-3, "Doomed", 1)).await;

        assert!(result.is_err());
        assert!(store.get(-3).is_none());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_files() {
        let dir = tempdir().unwrap();
        save_subscription(dir.path(), &RawSubscription::new(1, "One", 1)).unwrap();
        save_subscription(dir.path(), &RawSubscription::new(-2, "Two", 5)).unwrap();
        fs::write(dir.path().join("3.json"), b"garbage").unwrap();

        let store = RawSubscriptionStore::new(dir.path());
        let count = store.load_all().await.unwrap();

        assert_eq!(count, 2);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.keys().copied().collect::<Vec<_>>(), vec![-2, 1]);
        assert_eq!(snapshot[&-2].version, 5);
    }

    #[tokio::test]
    async fn test_remove_only_touches_memory() {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        store.upsert(RawSubscription::new(6, "Six", 1)).await.unwrap();

        assert!(store.remove(6).await.is_some());
        assert!(store.get(6).is_none());
        assert!(dir.path().join("6.json").exists());
        assert!(store.remove(6).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_immutable() {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        store.upsert(RawSubscription::new(1, "One", 1)).await.unwrap();

        let before = store.snapshot();
        store.upsert(RawSubscription::new(2, "Two", 1)).await.unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }
}
