//! Checking installed subscriptions for newer remote versions.

use subs_model::SubsItem;
use subs_persistence::{ItemRegistry, RawSubscriptionStore, StoreGuard};

use crate::client::SubscriptionFetcher;
use crate::error::{Result, UpdateError};
use crate::gate::accepts_update;

/// Outcome of one update pass.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Subscriptions replaced by a newer document, with their new version.
    pub updated: Vec<(i64, u32)>,
    /// Subscriptions already current, or whose fetch was rejected.
    pub skipped: Vec<i64>,
    /// Subscriptions whose check failed.
    pub failed: Vec<(i64, UpdateError)>,
}

impl UpdateReport {
    pub fn checked(&self) -> usize {
        self.updated.len() + self.skipped.len() + self.failed.len()
    }
}

enum Outcome {
    Updated(u32),
    Skipped,
}

/// Refresh every enabled subscription that has an update URL.
///
/// Runs entirely under the store lock so local edits cannot interleave.
/// A failure for one subscription is logged and recorded in the report; the
/// remaining subscriptions are still checked.
pub async fn check_updates<F: SubscriptionFetcher>(
    store: &RawSubscriptionStore,
    registry: &ItemRegistry,
    fetcher: &F,
) -> UpdateReport {
    let mut guard = store.lock().await;
    let items: Vec<SubsItem> = registry
        .snapshot()
        .iter()
        .filter(|item| item.wants_update())
        .cloned()
        .collect();

    tracing::info!("Checking {} subscriptions for updates", items.len());
    let mut report = UpdateReport::default();
    for item in &items {
        match check_one(&mut guard, registry, fetcher, item).await {
            Ok(Outcome::Updated(version)) => report.updated.push((item.id, version)),
            Ok(Outcome::Skipped) => report.skipped.push(item.id),
            Err(e) => {
                tracing::warn!(subs_id = item.id, "Update check failed: {e}");
                report.failed.push((item.id, e));
            }
        }
    }

    tracing::info!(
        updated = report.updated.len(),
        failed = report.failed.len(),
        "Update check finished"
    );
    report
}

async fn check_one<F: SubscriptionFetcher>(
    guard: &mut StoreGuard<'_>,
    registry: &ItemRegistry,
    fetcher: &F,
    item: &SubsItem,
) -> Result<Outcome> {
    let current = guard.get(item.id);
    let current_version = current.as_ref().map(|s| s.version);

    if let Some(check_url) = current.as_ref().and_then(|s| s.check_update_url.as_deref()) {
        match fetcher.fetch_version(check_url).await {
            Ok(descriptor) => {
                if !accepts_update(item.id, current_version, descriptor.id, descriptor.version) {
                    tracing::debug!(
                        subs_id = item.id,
                        remote_version = descriptor.version,
                        "No newer version announced"
                    );
                    return Ok(Outcome::Skipped);
                }
            }
            Err(e) => {
                tracing::debug!(subs_id = item.id, "Version check failed, fetching full document: {e}");
            }
        }
    }

    let Some(url) = current
        .as_ref()
        .and_then(|s| s.update_url.as_deref())
        .or(item.update_url.as_deref())
    else {
        return Ok(Outcome::Skipped);
    };

    let incoming = fetcher.fetch_subscription(url).await?;
    if !accepts_update(item.id, current_version, incoming.id, incoming.version) {
        tracing::debug!(
            subs_id = item.id,
            remote_id = incoming.id,
            remote_version = incoming.version,
            "Rejected fetched document"
        );
        return Ok(Outcome::Skipped);
    }

    let stored = guard.upsert(incoming).await?;
    registry.touch(item.id)?;
    tracing::info!(
        subs_id = item.id,
        from = ?current_version,
        to = stored.version,
        "Updated subscription {}",
        stored.name
    );
    Ok(Outcome::Updated(stored.version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use subs_model::{RawSubscription, VersionDescriptor};
    use subs_persistence::RecordFile;
    use tempfile::{TempDir, tempdir};

    #[derive(Default)]
    struct FakeFetcher {
        versions: HashMap<String, VersionDescriptor>,
        documents: HashMap<String, RawSubscription>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn not_found(url: &str) -> UpdateError {
            UpdateError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }
        }
    }

    impl SubscriptionFetcher for FakeFetcher {
        async fn fetch_version(&self, url: &str) -> Result<VersionDescriptor> {
            self.requests.lock().unwrap().push(url.to_string());
            self.versions
                .get(url)
                .copied()
                .ok_or_else(|| Self::not_found(url))
        }

        async fn fetch_subscription(&self, url: &str) -> Result<RawSubscription> {
            self.requests.lock().unwrap().push(url.to_string());
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| Self::not_found(url))
        }
    }

    fn remote(id: i64, version: u32) -> RawSubscription {
        let mut sub = RawSubscription::new(id, format!("Remote {id}"), version);
        sub.update_url = Some(url(id));
        sub
    }

    fn url(id: i64) -> String {
        format!("https://example.com/{id}.json")
    }

    async fn setup(installed: &[RawSubscription]) -> (TempDir, RawSubscriptionStore, ItemRegistry) {
        let dir = tempdir().unwrap();
        let store = RawSubscriptionStore::new(dir.path());
        let registry = ItemRegistry::open(RecordFile::in_memory(), dir.path()).unwrap();
        for (order, sub) in installed.iter().enumerate() {
            store.upsert(sub.clone()).await.unwrap();
            registry
                .insert(SubsItem::new(sub.id, order as i32, Some(url(sub.id))))
                .unwrap();
        }
        (dir, store, registry)
    }

    #[tokio::test]
    async fn test_newer_document_replaces_stored() {
        let (_dir, store, registry) = setup(&[remote(1, 1)]).await;
        let before = registry.get(1).unwrap().mtime;
        let fetcher = FakeFetcher {
            documents: HashMap::from([(url(1), remote(1, 2))]),
            ..FakeFetcher::default()
        };

        let report = check_updates(&store, &registry, &fetcher).await;

        assert_eq!(report.updated, vec![(1, 2)]);
        assert_eq!(store.get(1).unwrap().version, 2);
        assert!(registry.get(1).unwrap().mtime >= before);
    }

    #[tokio::test]
    async fn test_stale_or_foreign_document_is_skipped() {
        let (_dir, store, registry) = setup(&[remote(1, 5), remote(2, 1)]).await;
        let fetcher = FakeFetcher {
            documents: HashMap::from([(url(1), remote(1, 5)), (url(2), remote(3, 9))]),
            ..FakeFetcher::default()
        };

        let report = check_updates(&store, &registry, &fetcher).await;

        assert!(report.updated.is_empty());
        assert_eq!(report.skipped, vec![1, 2]);
        assert_eq!(store.get(1).unwrap().version, 5);
        assert_eq!(store.get(2).unwrap().name, "Remote 2");
        assert!(store.get(3).is_none());
    }

    #[tokio::test]
    async fn test_check_url_short_circuits_full_fetch() {
        let mut sub = remote(1, 3);
        sub.check_update_url = Some("https://example.com/1.version.json".to_string());
        let (_dir, store, registry) = setup(&[sub]).await;
        let fetcher = FakeFetcher {
            versions: HashMap::from([(
                "https://example.com/1.version.json".to_string(),
                VersionDescriptor { id: 1, version: 3 },
            )]),
            documents: HashMap::from([(url(1), remote(1, 4))]),
            ..FakeFetcher::default()
        };

        let report = check_updates(&store, &registry, &fetcher).await;

        assert_eq!(report.skipped, vec![1]);
        assert_eq!(fetcher.requests(), vec!["https://example.com/1.version.json"]);
    }

    #[tokio::test]
    async fn test_failed_check_falls_back_to_full_fetch() {
        let mut sub = remote(1, 3);
        sub.check_update_url = Some("https://example.com/missing.json".to_string());
        let (_dir, store, registry) = setup(&[sub]).await;
        let fetcher = FakeFetcher {
            documents: HashMap::from([(url(1), remote(1, 4))]),
            ..FakeFetcher::default()
        };

        let report = check_updates(&store, &registry, &fetcher).await;

        assert_eq!(report.updated, vec![(1, 4)]);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_pass() {
        let (_dir, store, registry) = setup(&[remote(1, 1), remote(2, 1)]).await;
        let fetcher = FakeFetcher {
            documents: HashMap::from([(url(2), remote(2, 2))]),
            ..FakeFetcher::default()
        };

        let report = check_updates(&store, &registry, &fetcher).await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        assert!(matches!(
            report.failed[0].1,
            UpdateError::HttpStatus { status: 404, .. }
        ));
        assert_eq!(report.updated, vec![(2, 2)]);
        assert_eq!(report.checked(), 2);
    }

    #[tokio::test]
    async fn test_items_not_wanting_updates_are_ignored() {
        let (_dir, store, registry) = setup(&[remote(1, 1), remote(2, 1)]).await;
        registry.set_enable(1, false).unwrap();
        registry.set_enable_update(2, false).unwrap();
        let fetcher = FakeFetcher::default();

        let report = check_updates(&store, &registry, &fetcher).await;

        assert_eq!(report.checked(), 0);
        assert!(fetcher.requests().is_empty());
    }
}
