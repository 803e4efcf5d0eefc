//! Installed-app map with incremental patching.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use subs_model::AppInfo;
use tokio::sync::{Mutex, watch};

use crate::error::Result;
use crate::source::PackageSource;

/// Installed apps keyed by package id.
pub type AppMap = BTreeMap<String, AppInfo>;

/// Kind of package notification received from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageEventKind {
    Added,
    Replaced,
    Removed,
}

/// Observable cache of installed applications.
///
/// Incremental updates are serialized by a lock of their own, independent of
/// the subscription store lock. A full rebuild is skipped while an update is
/// in flight.
pub struct AppInfoCache {
    source: Arc<dyn PackageSource>,
    update_lock: Mutex<()>,
    apps: watch::Sender<Arc<AppMap>>,
}

impl fmt::Debug for AppInfoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInfoCache")
            .field("apps", &self.apps.borrow().len())
            .finish_non_exhaustive()
    }
}

impl AppInfoCache {
    /// Create an empty cache. Call [`rebuild_all`](Self::rebuild_all) to fill it.
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        Self {
            source,
            update_lock: Mutex::new(()),
            apps: watch::Sender::new(Arc::new(AppMap::new())),
        }
    }

    pub fn snapshot(&self) -> Arc<AppMap> {
        Arc::clone(&self.apps.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppMap>> {
        self.apps.subscribe()
    }

    pub fn get(&self, app_id: &str) -> Option<AppInfo> {
        self.apps.borrow().get(app_id).cloned()
    }

    pub fn is_installed(&self, app_id: &str) -> bool {
        self.apps.borrow().contains_key(app_id)
    }

    /// Replace the whole map with a fresh package scan.
    ///
    /// Returns `false` without scanning when an incremental update holds the
    /// lock.
    pub async fn rebuild_all(&self) -> Result<bool> {
        let Ok(_guard) = self.update_lock.try_lock() else {
            tracing::debug!("Skipping app rebuild, incremental update in flight");
            return Ok(false);
        };

        let source = Arc::clone(&self.source);
        let packages = tokio::task::spawn_blocking(move || source.installed_packages()).await??;
        let map: AppMap = packages.into_iter().map(|a| (a.id.clone(), a)).collect();

        tracing::info!("Rebuilt app cache with {} apps", map.len());
        self.apps.send_if_modified(|current| {
            if **current == map {
                return false;
            }
            *current = Arc::new(map);
            true
        });
        Ok(true)
    }

    /// Patch one entry after a package notification.
    ///
    /// The package is looked up afresh instead of trusting the event, since
    /// store updates can arrive as Removed, Added, Replaced in quick
    /// succession for what is one update to the user.
    pub async fn apply_event(&self, app_id: &str, kind: PackageEventKind) -> Result<()> {
        let _guard = self.update_lock.lock().await;

        let source = Arc::clone(&self.source);
        let id = app_id.to_string();
        let current = tokio::task::spawn_blocking(move || source.package(&id)).await??;

        tracing::debug!(app_id, ?kind, installed = current.is_some(), "Package event");
        self.apps.send_if_modified(|map| match current {
            Some(info) => {
                if map.get(app_id) == Some(&info) {
                    return false;
                }
                Arc::make_mut(map).insert(app_id.to_string(), info);
                true
            }
            None => Arc::make_mut(map).remove(app_id).is_some(),
        });
        Ok(())
    }
}
