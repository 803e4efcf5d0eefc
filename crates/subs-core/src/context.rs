//! The service context.

use std::fmt;
use std::sync::{Arc, Weak};

use subs_appinfo::{AppInfoCache, PackageEventKind, PackageSource};
use subs_model::{RawSubscription, SubsItem, validate_subscription};
use subs_persistence::{ItemRegistry, OverrideStore, RawSubscriptionStore, RecordFile};
use subs_resolve::{ResolverInputs, RuleSummary, spawn_resolver};
use subs_updater::{HttpFetcher, SubscriptionFetcher, UpdateReport, check_updates};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::EngineConfig;
use crate::error::{CoreError, Result};

/// Every store, the app cache and the resolver, constructed once at startup.
///
/// Consumers read the latest [`RuleSummary`] through [`summary`](Self::summary)
/// and write user records through the store accessors.
pub struct SubsContext<F = HttpFetcher> {
    config: EngineConfig,
    store: RawSubscriptionStore,
    registry: ItemRegistry,
    overrides: OverrideStore,
    apps: AppInfoCache,
    fetcher: F,
    summary: watch::Receiver<Arc<RuleSummary>>,
    resolver: JoinHandle<()>,
    /// Never sent on; background tasks stop when it is dropped.
    shutdown: watch::Sender<()>,
}

impl<F> fmt::Debug for SubsContext<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsContext")
            .field("data_dir", &self.config.data_dir)
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field("apps", &self.apps)
            .finish_non_exhaustive()
    }
}

impl SubsContext<HttpFetcher> {
    /// Open the context with an HTTP fetcher built from the update settings.
    pub async fn open(config: EngineConfig, packages: Arc<dyn PackageSource>) -> Result<Self> {
        let fetcher =
            HttpFetcher::with_options(&config.updates.user_agent, config.updates.timeout())?;
        Self::open_with_fetcher(config, packages, fetcher).await
    }
}

impl<F: SubscriptionFetcher + 'static> SubsContext<F> {
    /// Load persisted state, scan installed apps and start the resolver.
    pub async fn open_with_fetcher(
        config: EngineConfig,
        packages: Arc<dyn PackageSource>,
        fetcher: F,
    ) -> Result<Self> {
        let store = RawSubscriptionStore::new(config.subscriptions_dir());
        let loaded = store.load_all().await?;
        let registry = ItemRegistry::open(
            RecordFile::at(config.items_path()),
            config.subscriptions_dir(),
        )?;
        let overrides = OverrideStore::open(RecordFile::at(config.overrides_path()))?;
        let apps = AppInfoCache::new(packages);
        apps.rebuild_all().await?;

        for item in registry.snapshot().iter() {
            if store.get(item.id).is_none() {
                tracing::warn!(subs_id = item.id, "Installed subscription has no document");
            }
        }

        let (summary, resolver) = spawn_resolver(ResolverInputs {
            items: registry.subscribe(),
            subscriptions: store.subscribe(),
            apps: apps.subscribe(),
            overrides: overrides.subscribe(),
        });

        tracing::info!(
            data_dir = %config.data_dir.display(),
            documents = loaded,
            rules = %summary.borrow().num_text(),
            "Opened subscription context"
        );
        Ok(Self {
            config,
            store,
            registry,
            overrides,
            apps,
            fetcher,
            summary,
            resolver,
            shutdown: watch::Sender::new(()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &RawSubscriptionStore {
        &self.store
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn apps(&self) -> &AppInfoCache {
        &self.apps
    }

    /// Observe the resolved rule summary.
    pub fn summary(&self) -> watch::Receiver<Arc<RuleSummary>> {
        self.summary.clone()
    }

    /// The latest resolved rule summary.
    pub fn current_summary(&self) -> Arc<RuleSummary> {
        Arc::clone(&self.summary.borrow())
    }

    /// Whether the resolver task is still running.
    pub fn is_resolving(&self) -> bool {
        !self.resolver.is_finished()
    }

    /// Store an edited document of an installed subscription.
    ///
    /// Group validity is recomputed before storing.
    pub async fn update_subscription(
        &self,
        mut subscription: RawSubscription,
    ) -> Result<Arc<RawSubscription>> {
        let id = subscription.id;
        if self.registry.get(id).is_none() {
            return Err(CoreError::NotInstalled(id));
        }
        validate_subscription(&mut subscription);

        let stored = self.store.upsert(subscription).await?;
        self.registry.touch(id)?;
        Ok(stored)
    }

    /// Uninstall a subscription.
    ///
    /// Removes every dependent override, the install record with its file,
    /// then the in-memory document. Returns `false` if nothing was installed.
    /// If a persistent step fails the document stays loaded.
    pub async fn delete_subscription(&self, id: i64) -> Result<bool> {
        let mut guard = self.store.lock().await;
        let overrides = self.overrides.remove_subscription(id)?;
        let item = self.registry.remove(id)?;
        let document = guard.remove(id);

        let removed = document.is_some() || item.is_some();
        if removed {
            tracing::info!(subs_id = id, overrides, "Deleted subscription");
        }
        Ok(removed)
    }

    /// Install a remote subscription from its update URL.
    pub async fn add_from_url(&self, url: &str) -> Result<Arc<RawSubscription>> {
        let subscription = self.fetcher.fetch_subscription(url).await?;
        let id = subscription.id;
        if subscription.is_local() {
            return Err(CoreError::LocalIdFromRemote(id));
        }

        let mut guard = self.store.lock().await;
        if self.registry.get(id).is_some() {
            return Err(CoreError::AlreadyInstalled(id));
        }
        let stored = guard.upsert(subscription).await?;
        self.registry.insert(SubsItem::new(
            id,
            self.registry.next_order(),
            Some(url.to_string()),
        ))?;

        tracing::info!(subs_id = id, url, "Added subscription {}", stored.name);
        Ok(stored)
    }

    /// Install a locally authored subscription.
    ///
    /// Documents without a free negative id are given one.
    pub async fn import_local(
        &self,
        mut subscription: RawSubscription,
    ) -> Result<Arc<RawSubscription>> {
        let mut guard = self.store.lock().await;
        let taken = |id: i64| self.registry.get(id).is_some() || guard.get(id).is_some();
        if !subscription.is_local() || taken(subscription.id) {
            let fresh = self.fresh_local_id();
            tracing::debug!(from = subscription.id, to = fresh, "Assigned local id");
            subscription.id = fresh;
        }
        validate_subscription(&mut subscription);

        let id = subscription.id;
        let stored = guard.upsert(subscription).await?;
        self.registry
            .insert(SubsItem::new(id, self.registry.next_order(), None))?;

        tracing::info!(subs_id = id, "Imported subscription {}", stored.name);
        Ok(stored)
    }

    /// Run one update pass over every installed subscription.
    pub async fn check_updates(&self) -> UpdateReport {
        check_updates(&self.store, &self.registry, &self.fetcher).await
    }

    /// Rescan installed apps. Returns `false` if skipped.
    pub async fn rebuild_apps(&self) -> Result<bool> {
        Ok(self.apps.rebuild_all().await?)
    }

    /// Forward a host package notification to the app cache.
    pub async fn apply_package_event(&self, app_id: &str, kind: PackageEventKind) -> Result<()> {
        Ok(self.apps.apply_event(app_id, kind).await?)
    }

    /// Start the periodic update task, if updates are enabled.
    ///
    /// The first pass runs immediately. Each pass also rescans installed apps
    /// as a consistency fallback. The task ends as soon as the context is
    /// dropped, without waiting for the next tick.
    pub fn spawn_periodic_updates(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.updates.enabled {
            tracing::info!("Periodic update checks disabled");
            return None;
        }

        let context: Weak<Self> = Arc::downgrade(self);
        let mut shutdown = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.config.updates.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.changed() => break,
                }
                let Some(context) = context.upgrade() else {
                    break;
                };
                let report = context.check_updates().await;
                tracing::debug!(
                    checked = report.checked(),
                    updated = report.updated.len(),
                    "Periodic update pass"
                );
                if let Err(e) = context.rebuild_apps().await {
                    tracing::warn!("App rescan failed: {e}");
                }
            }
        }))
    }

    fn fresh_local_id(&self) -> i64 {
        let lowest = self
            .registry
            .snapshot()
            .iter()
            .map(|item| item.id)
            .chain(self.store.snapshot().keys().copied())
            .min()
            .unwrap_or(0);
        lowest.min(0) - 1
    }
}
