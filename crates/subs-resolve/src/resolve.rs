//! The merge pass turning raw documents and overrides into a [`RuleSummary`].

use std::collections::BTreeMap;
use std::sync::Arc;

use subs_model::{
    AppInfo, CategoryConfig, Overrides, RawApp, RawSubscription, SubsConfigKey, SubsItem,
};

use crate::enable::{global_group_enable, group_raw_enable};
use crate::group::{AppRule, GlobalRule, ResolvedAppGroup, ResolvedGlobalGroup};
use crate::summary::RuleSummary;

/// Borrowed snapshot of every resolution input.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub items: &'a [SubsItem],
    pub subscriptions: &'a BTreeMap<i64, Arc<RawSubscription>>,
    pub apps: &'a BTreeMap<String, AppInfo>,
    pub overrides: &'a Overrides,
}

/// Compute the active rule set.
///
/// Pure: equal inputs produce equal output, including list order.
pub fn resolve(input: &ResolveInput<'_>) -> RuleSummary {
    let mut items: Vec<&SubsItem> = input.items.iter().filter(|item| item.enable).collect();
    items.sort_by_key(|item| (item.order, item.id));

    let mut summary = RuleSummary::default();
    for item in items {
        let Some(subscription) = input.subscriptions.get(&item.id) else {
            tracing::debug!(subs_id = item.id, "No document for enabled subscription");
            continue;
        };
        resolve_global(&mut summary, input, subscription, item);
        for (app_index, app) in subscription.apps.iter().enumerate() {
            resolve_app(&mut summary, input, subscription, item, app_index, app);
        }
    }

    tracing::trace!(counts = %summary.num_text(), "Resolved rule summary");
    summary
}

fn resolve_global(
    summary: &mut RuleSummary,
    input: &ResolveInput<'_>,
    subscription: &Arc<RawSubscription>,
    item: &SubsItem,
) {
    let groups: Arc<[Arc<ResolvedGlobalGroup>]> = subscription
        .global_groups
        .iter()
        .enumerate()
        .filter(|(_, group)| {
            group.valid && global_group_enable(subscription, input.overrides, group)
        })
        .map(|(index, group)| {
            let config = input
                .overrides
                .get(&SubsConfigKey::global_group(subscription.id, group.key))
                .cloned();
            Arc::new(ResolvedGlobalGroup::new(
                Arc::clone(subscription),
                item.clone(),
                config,
                index,
            ))
        })
        .collect();

    for group in groups.iter() {
        let mut slow = false;
        for index in 0..group.group().rules.len() {
            let rule = GlobalRule::new(Arc::clone(group), Arc::clone(&groups), index);
            slow |= rule.is_slow();
            summary.global_rules.push(rule);
        }
        if slow {
            summary.slow_global_groups.push(Arc::clone(group));
        }
        summary.global_groups.push(Arc::clone(group));
    }
}

fn resolve_app(
    summary: &mut RuleSummary,
    input: &ResolveInput<'_>,
    subscription: &Arc<RawSubscription>,
    item: &SubsItem,
    app_index: usize,
    app: &RawApp,
) {
    if app.groups.is_empty() {
        return;
    }
    let installed = input.apps.get(&app.id);
    let applicable = input
        .overrides
        .app_enable(subscription.id, &app.id)
        .unwrap_or(installed.is_some());
    if !applicable {
        return;
    }

    let version_code = installed.map(|info| info.version_code);
    let version_name = installed.and_then(|info| info.version_name.as_deref());

    for (group_index, group) in app.groups.iter().enumerate() {
        if !group.valid {
            continue;
        }
        let enable = group_raw_enable(subscription, input.overrides, &app.id, group);
        let config = input
            .overrides
            .get(&SubsConfigKey::app_group(subscription.id, &app.id, group.key))
            .cloned();
        let category_config = group.category_key.and_then(|key| {
            input
                .overrides
                .category_enable(subscription.id, key)
                .map(|enable| CategoryConfig {
                    subs_id: subscription.id,
                    category_key: key,
                    enable: Some(enable),
                })
        });
        let resolved = Arc::new(ResolvedAppGroup::new(
            Arc::clone(subscription),
            item.clone(),
            (app_index, group_index),
            config,
            category_config,
            enable,
        ));
        summary
            .app_id_to_all_groups
            .entry(app.id.clone())
            .or_default()
            .push(Arc::clone(&resolved));

        if !enable {
            continue;
        }
        let rules: Vec<AppRule> = group
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| {
                rule.enable != Some(false) && rule.matches_app_version(version_code, version_name)
            })
            .map(|(index, _)| AppRule::new(Arc::clone(&resolved), index))
            .collect();
        if rules.is_empty() {
            continue;
        }

        if rules.iter().any(AppRule::is_slow) {
            summary.slow_app_groups.push(Arc::clone(&resolved));
        }
        summary
            .app_id_to_groups
            .entry(app.id.clone())
            .or_default()
            .push(resolved);
        summary
            .app_id_to_rules
            .entry(app.id.clone())
            .or_default()
            .extend(rules);
    }
}
