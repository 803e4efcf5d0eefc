//! Resolved groups and compiled rules.
//!
//! Resolved groups point into their subscription document by index rather
//! than copying the raw group. Compiled rules in turn point at their group
//! and an index into its rule list; the group's rule list is the single
//! authoritative arena, so rules never reference each other directly.

use std::sync::Arc;

use subs_model::{CategoryConfig, RawApp, RawGroup, RawRule, RawSubscription, SubsConfig, SubsItem};

/// A global group that resolved to enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGlobalGroup {
    pub subscription: Arc<RawSubscription>,
    pub item: SubsItem,
    pub config: Option<SubsConfig>,
    group_index: usize,
}

impl ResolvedGlobalGroup {
    pub(crate) fn new(
        subscription: Arc<RawSubscription>,
        item: SubsItem,
        config: Option<SubsConfig>,
        group_index: usize,
    ) -> Self {
        Self {
            subscription,
            item,
            config,
            group_index,
        }
    }

    pub fn group(&self) -> &RawGroup {
        &self.subscription.global_groups[self.group_index]
    }

    pub fn subs_id(&self) -> i64 {
        self.subscription.id
    }
}

/// An app group paired with its owning records and resolved enable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAppGroup {
    pub subscription: Arc<RawSubscription>,
    pub item: SubsItem,
    pub config: Option<SubsConfig>,
    pub category_config: Option<CategoryConfig>,
    pub enable: bool,
    app_index: usize,
    group_index: usize,
}

impl ResolvedAppGroup {
    pub(crate) fn new(
        subscription: Arc<RawSubscription>,
        item: SubsItem,
        (app_index, group_index): (usize, usize),
        config: Option<SubsConfig>,
        category_config: Option<CategoryConfig>,
        enable: bool,
    ) -> Self {
        Self {
            subscription,
            item,
            config,
            category_config,
            enable,
            app_index,
            group_index,
        }
    }

    pub fn app(&self) -> &RawApp {
        &self.subscription.apps[self.app_index]
    }

    pub fn app_id(&self) -> &str {
        &self.app().id
    }

    pub fn group(&self) -> &RawGroup {
        &self.app().groups[self.group_index]
    }

    pub fn subs_id(&self) -> i64 {
        self.subscription.id
    }
}

/// A compiled global rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRule {
    pub group: Arc<ResolvedGlobalGroup>,
    /// Every enabled global group of the same subscription, in declaration order.
    pub peer_groups: Arc<[Arc<ResolvedGlobalGroup>]>,
    index: usize,
}

impl GlobalRule {
    pub(crate) fn new(
        group: Arc<ResolvedGlobalGroup>,
        peer_groups: Arc<[Arc<ResolvedGlobalGroup>]>,
        index: usize,
    ) -> Self {
        Self {
            group,
            peer_groups,
            index,
        }
    }

    pub fn rule(&self) -> &RawRule {
        &self.group.group().rules[self.index]
    }

    /// Position of this rule in its group.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Every rule of the owning group, this one included.
    pub fn group_rules(&self) -> &[RawRule] {
        &self.group.group().rules
    }

    /// Sibling rules named by this rule's `preKeys`.
    pub fn pre_rules(&self) -> impl Iterator<Item = &RawRule> {
        pre_rules(self.rule(), self.group_rules())
    }

    pub fn is_slow(&self) -> bool {
        self.rule().is_slow()
    }
}

/// A compiled app rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRule {
    pub group: Arc<ResolvedAppGroup>,
    index: usize,
}

impl AppRule {
    pub(crate) fn new(group: Arc<ResolvedAppGroup>, index: usize) -> Self {
        Self { group, index }
    }

    pub fn rule(&self) -> &RawRule {
        &self.group.group().rules[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn app_id(&self) -> &str {
        self.group.app_id()
    }

    pub fn group_rules(&self) -> &[RawRule] {
        &self.group.group().rules
    }

    pub fn pre_rules(&self) -> impl Iterator<Item = &RawRule> {
        pre_rules(self.rule(), self.group_rules())
    }

    pub fn is_slow(&self) -> bool {
        self.rule().is_slow()
    }
}

fn pre_rules<'a>(rule: &'a RawRule, siblings: &'a [RawRule]) -> impl Iterator<Item = &'a RawRule> {
    rule.pre_keys
        .iter()
        .filter_map(|key| siblings.iter().find(|r| r.key == Some(*key)))
}
