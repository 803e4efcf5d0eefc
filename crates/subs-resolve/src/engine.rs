//! Reactive recomputation of the rule summary.
//!
//! The resolver task listens on the four input channels and republishes a
//! fresh [`RuleSummary`] whenever any of them changes. Each pass reads one
//! consistent snapshot per input.

use std::collections::BTreeMap;
use std::sync::Arc;

use subs_model::{AppInfo, Overrides, RawSubscription, SubsItem};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::resolve::{ResolveInput, resolve};
use crate::summary::RuleSummary;

/// Observers of every store the resolver depends on.
#[derive(Debug, Clone)]
pub struct ResolverInputs {
    pub items: watch::Receiver<Arc<Vec<SubsItem>>>,
    pub subscriptions: watch::Receiver<Arc<BTreeMap<i64, Arc<RawSubscription>>>>,
    pub apps: watch::Receiver<Arc<BTreeMap<String, AppInfo>>>,
    pub overrides: watch::Receiver<Arc<Overrides>>,
}

impl ResolverInputs {
    /// Take the latest value of every input, marking them seen.
    pub fn snapshot_latest(&mut self) -> InputSnapshot {
        InputSnapshot {
            items: Arc::clone(&self.items.borrow_and_update()),
            subscriptions: Arc::clone(&self.subscriptions.borrow_and_update()),
            apps: Arc::clone(&self.apps.borrow_and_update()),
            overrides: Arc::clone(&self.overrides.borrow_and_update()),
        }
    }

    /// Resolve the latest values, marking them seen.
    pub fn resolve_latest(&mut self) -> RuleSummary {
        self.snapshot_latest().resolve()
    }
}

/// Owned values of every input at one point in time.
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    pub items: Arc<Vec<SubsItem>>,
    pub subscriptions: Arc<BTreeMap<i64, Arc<RawSubscription>>>,
    pub apps: Arc<BTreeMap<String, AppInfo>>,
    pub overrides: Arc<Overrides>,
}

impl InputSnapshot {
    pub fn resolve(&self) -> RuleSummary {
        resolve(&ResolveInput {
            items: &self.items,
            subscriptions: &self.subscriptions,
            apps: &self.apps,
            overrides: &self.overrides,
        })
    }
}

/// Start the resolver task.
///
/// The returned receiver holds a summary of the current inputs immediately.
/// The task ends when every summary receiver is dropped or an input store
/// goes away. Recomputation runs on the blocking pool.
pub fn spawn_resolver(
    mut inputs: ResolverInputs,
) -> (watch::Receiver<Arc<RuleSummary>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(Arc::new(inputs.resolve_latest()));
    let handle = tokio::spawn(run_resolver(inputs, tx));
    (rx, handle)
}

async fn run_resolver(mut inputs: ResolverInputs, tx: watch::Sender<Arc<RuleSummary>>) {
    loop {
        let changed = tokio::select! {
            r = inputs.items.changed() => r,
            r = inputs.subscriptions.changed() => r,
            r = inputs.apps.changed() => r,
            r = inputs.overrides.changed() => r,
            () = tx.closed() => break,
        };
        if changed.is_err() {
            tracing::debug!("Resolver input closed, stopping");
            break;
        }

        // This task is the only sender, so `current` stays current until the send.
        let snapshot = inputs.snapshot_latest();
        let current = Arc::clone(&tx.borrow());
        let next = tokio::task::spawn_blocking(move || {
            let summary = snapshot.resolve();
            (summary != *current).then_some(summary)
        })
        .await;

        match next {
            Ok(Some(summary)) => {
                tx.send_replace(Arc::new(summary));
                tracing::debug!(counts = %tx.borrow().num_text(), "Published rule summary");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Resolver pass failed: {e}");
                break;
            }
        }
    }
}
