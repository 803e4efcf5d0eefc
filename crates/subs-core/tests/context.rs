//! Integration tests for the service context.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subs_appinfo::{ManifestPackageSource, PackageEventKind};
use subs_core::{CoreError, EngineConfig, SubsContext};
use subs_model::{AppInfo, RawApp, RawGroup, RawRule, RawSubscription, SubsConfig, VersionDescriptor};
use subs_resolve::RuleSummary;
use subs_updater::{SubscriptionFetcher, UpdateError};
use tempfile::{TempDir, tempdir};

const APP: &str = "com.example.app";

#[derive(Clone, Default)]
struct FakeFetcher {
    documents: Arc<Mutex<HashMap<String, RawSubscription>>>,
}

impl FakeFetcher {
    fn serve(&self, url: &str, subscription: RawSubscription) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), subscription);
    }
}

impl SubscriptionFetcher for FakeFetcher {
    async fn fetch_version(&self, url: &str) -> subs_updater::Result<VersionDescriptor> {
        Err(UpdateError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_subscription(&self, url: &str) -> subs_updater::Result<RawSubscription> {
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| UpdateError::Network(format!("unreachable: {url}")))
    }
}

struct Harness {
    dir: TempDir,
    fetcher: FakeFetcher,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
            fetcher: FakeFetcher::default(),
        }
    }

    fn config(&self) -> EngineConfig {
        EngineConfig::with_data_dir(self.dir.path())
    }

    fn install_apps(&self, apps: &[AppInfo]) {
        let path = self.config().apps_path();
        std::fs::write(path, serde_json::to_string(apps).unwrap()).unwrap();
    }

    async fn open(&self) -> SubsContext<FakeFetcher> {
        let config = self.config();
        let packages = Arc::new(ManifestPackageSource::new(config.apps_path()));
        SubsContext::open_with_fetcher(config, packages, self.fetcher.clone())
            .await
            .unwrap()
    }

    fn data_dir(&self) -> &Path {
        self.dir.path()
    }
}

fn group(key: i32, selector: &str) -> RawGroup {
    let mut g = RawGroup::new(key, format!("g{key}"));
    g.rules.push(RawRule::with_match(selector));
    g
}

fn global_doc(id: i64, version: u32) -> RawSubscription {
    let mut sub = RawSubscription::new(id, format!("Doc {id}"), version);
    sub.global_groups.push(group(0, "[text=Skip]"));
    sub
}

fn app_doc(id: i64) -> RawSubscription {
    let mut sub = RawSubscription::new(id, format!("Doc {id}"), 1);
    sub.apps.push(RawApp {
        id: APP.to_string(),
        name: None,
        groups: vec![group(1, "[id=close]")],
    });
    sub
}

async fn wait_for<F>(
    context: &SubsContext<F>,
    predicate: impl FnMut(&Arc<RuleSummary>) -> bool,
) -> Arc<RuleSummary>
where
    F: SubscriptionFetcher + 'static,
{
    let mut rx = context.summary();
    let guard = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("summary did not reach expected state")
        .unwrap();
    let summary = Arc::clone(&guard);
    drop(guard);
    summary
}

#[tokio::test]
async fn test_open_empty_data_dir() {
    let harness = Harness::new();
    let context = harness.open().await;

    assert!(context.current_summary().is_empty());
    assert!(context.registry().snapshot().is_empty());
    assert!(context.is_resolving());
}

#[tokio::test]
async fn test_import_assigns_local_id_and_resolves() {
    let harness = Harness::new();
    let context = harness.open().await;

    let stored = context.import_local(global_doc(5, 1)).await.unwrap();
    assert_eq!(stored.id, -1);
    let second = context.import_local(global_doc(-1, 1)).await.unwrap();
    assert_eq!(second.id, -2);

    let summary = wait_for(&context, |s| s.global_rules.len() == 2).await;
    assert_eq!(summary.global_rules[0].group.subs_id(), -1);
    assert_eq!(summary.global_rules[1].group.subs_id(), -2);
    assert!(harness.data_dir().join("subscriptions/-1.json").exists());
}

#[tokio::test]
async fn test_group_override_disables_app_group() {
    let harness = Harness::new();
    harness.install_apps(&[AppInfo::new(APP, "Example")]);
    let context = harness.open().await;
    context.import_local(app_doc(-1)).await.unwrap();
    wait_for(&context, |s| s.app_rules(APP).len() == 1).await;

    context
        .overrides()
        .upsert_config(SubsConfig::app_group(-1, APP, 1, Some(false)))
        .unwrap();

    let summary = wait_for(&context, |s| s.app_rules(APP).is_empty()).await;
    let groups = summary.app_all_groups(APP);
    assert_eq!(groups.len(), 1);
    assert!(!groups[0].enable);
}

#[tokio::test]
async fn test_package_event_brings_app_rules_in() {
    let harness = Harness::new();
    let context = harness.open().await;
    context.import_local(app_doc(-1)).await.unwrap();
    wait_for(&context, |s| s.app_all_groups(APP).is_empty()).await;

    harness.install_apps(&[AppInfo::new(APP, "Example")]);
    context
        .apply_package_event(APP, PackageEventKind::Added)
        .await
        .unwrap();

    wait_for(&context, |s| s.app_rules(APP).len() == 1).await;
}

#[tokio::test]
async fn test_add_from_url_then_update() {
    let harness = Harness::new();
    let url = "https://example.com/7.json";
    harness.fetcher.serve(url, global_doc(7, 1));
    let context = harness.open().await;

    let stored = context.add_from_url(url).await.unwrap();
    assert_eq!(stored.id, 7);
    let item = context.registry().get(7).unwrap();
    assert_eq!(item.update_url.as_deref(), Some(url));

    let again = context.add_from_url(url).await;
    assert!(matches!(again, Err(CoreError::AlreadyInstalled(7))));

    harness.fetcher.serve(url, global_doc(7, 2));
    let report = context.check_updates().await;
    assert_eq!(report.updated, vec![(7, 2)]);
    assert_eq!(context.store().get(7).unwrap().version, 2);
}

#[tokio::test]
async fn test_add_from_url_rejects_local_document() {
    let harness = Harness::new();
    let url = "https://example.com/local.json";
    harness.fetcher.serve(url, global_doc(-3, 1));
    let context = harness.open().await;

    let result = context.add_from_url(url).await;

    assert!(matches!(result, Err(CoreError::LocalIdFromRemote(-3))));
    assert!(context.registry().snapshot().is_empty());
    assert!(context.store().get(-3).is_none());
}

#[tokio::test]
async fn test_delete_removes_everything() {
    let harness = Harness::new();
    let context = harness.open().await;
    context.import_local(global_doc(-1, 1)).await.unwrap();
    context
        .overrides()
        .upsert_config(SubsConfig::global_group(-1, 0, Some(true)))
        .unwrap();
    wait_for(&context, |s| !s.is_empty()).await;

    assert!(context.delete_subscription(-1).await.unwrap());

    wait_for(&context, |s| s.is_empty()).await;
    assert!(context.registry().get(-1).is_none());
    assert!(context.store().get(-1).is_none());
    assert!(context.overrides().snapshot().is_empty());
    assert!(!harness.data_dir().join("subscriptions/-1.json").exists());
    assert!(!context.delete_subscription(-1).await.unwrap());
}

#[tokio::test]
async fn test_failed_delete_keeps_subscription_loaded() {
    let harness = Harness::new();
    let context = harness.open().await;
    context.import_local(global_doc(-1, 1)).await.unwrap();
    context
        .overrides()
        .upsert_config(SubsConfig::global_group(-1, 0, Some(true)))
        .unwrap();
    wait_for(&context, |s| !s.is_empty()).await;

    // A directory in place of the override file makes the atomic rename fail.
    let overrides_path = harness.config().overrides_path();
    std::fs::remove_file(&overrides_path).unwrap();
    std::fs::create_dir(&overrides_path).unwrap();

    assert!(context.delete_subscription(-1).await.is_err());

    assert!(context.store().get(-1).is_some());
    assert!(context.registry().get(-1).is_some());
    assert!(harness.data_dir().join("subscriptions/-1.json").exists());
    assert_eq!(context.overrides().snapshot().len(), 1);
    assert_eq!(context.current_summary().global_rules.len(), 1);
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let harness = Harness::new();
    {
        let context = harness.open().await;
        context.import_local(global_doc(-1, 1)).await.unwrap();
        context.registry().set_enable_update(-1, false).unwrap();
    }

    let context = harness.open().await;

    assert_eq!(context.store().get(-1).unwrap().version, 1);
    assert!(!context.registry().get(-1).unwrap().enable_update);
    assert_eq!(context.current_summary().global_rules.len(), 1);
}

#[tokio::test]
async fn test_local_edit_bumps_version() {
    let harness = Harness::new();
    let context = harness.open().await;
    context.import_local(global_doc(-1, 4)).await.unwrap();

    let mut edited = global_doc(-1, 4);
    edited.name = "Renamed".to_string();
    let stored = context.update_subscription(edited).await.unwrap();

    assert_eq!(stored.version, 5);
    assert_eq!(stored.name, "Renamed");

    let missing = context.update_subscription(global_doc(-9, 1)).await;
    assert!(matches!(missing, Err(CoreError::NotInstalled(-9))));
}

#[tokio::test]
async fn test_periodic_updates_respect_config() {
    let harness = Harness::new();
    let mut config = harness.config();
    config.updates.enabled = false;
    let packages = Arc::new(ManifestPackageSource::new(config.apps_path()));
    let context = Arc::new(
        SubsContext::open_with_fetcher(config, packages, harness.fetcher.clone())
            .await
            .unwrap(),
    );

    assert!(context.spawn_periodic_updates().is_none());
}

#[tokio::test]
async fn test_periodic_task_ends_with_context() {
    let harness = Harness::new();
    let context = Arc::new(harness.open().await);
    let task = context.spawn_periodic_updates().unwrap();

    // Dropped before the first tick runs, so the task finds no context.
    drop(context);

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("update task kept running")
        .unwrap();
}

#[tokio::test]
async fn test_periodic_task_stops_without_waiting_for_next_tick() {
    let harness = Harness::new();
    let mut config = harness.config();
    config.updates.interval_secs = 3600;
    let packages = Arc::new(ManifestPackageSource::new(config.apps_path()));
    let context = Arc::new(
        SubsContext::open_with_fetcher(config, packages, harness.fetcher.clone())
            .await
            .unwrap(),
    );
    let task = context.spawn_periodic_updates().unwrap();

    // Let the immediate first pass finish; the next tick is an hour away.
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(context);

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("update task waited for the next tick")
        .unwrap();
}
