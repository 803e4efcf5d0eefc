//! The resolved rule view.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::group::{AppRule, GlobalRule, ResolvedAppGroup, ResolvedGlobalGroup};

/// Immutable snapshot of every active rule.
///
/// Lists follow subscription install order, then declaration order inside
/// each document. A new summary replaces the old one wholesale on every
/// recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSummary {
    pub global_rules: Vec<GlobalRule>,
    pub global_groups: Vec<Arc<ResolvedGlobalGroup>>,
    /// Active rules per app.
    pub app_id_to_rules: BTreeMap<String, Vec<AppRule>>,
    /// Enabled groups contributing at least one rule, per app.
    pub app_id_to_groups: BTreeMap<String, Vec<Arc<ResolvedAppGroup>>>,
    /// Every valid group of every applicable app, enabled or not.
    pub app_id_to_all_groups: BTreeMap<String, Vec<Arc<ResolvedAppGroup>>>,
    /// Global groups holding at least one slow rule, each listed once.
    pub slow_global_groups: Vec<Arc<ResolvedGlobalGroup>>,
    /// App groups holding at least one active slow rule, each listed once.
    pub slow_app_groups: Vec<Arc<ResolvedAppGroup>>,
}

impl RuleSummary {
    pub fn is_empty(&self) -> bool {
        self.global_rules.is_empty() && self.app_id_to_rules.is_empty()
    }

    /// Active rules for one app.
    pub fn app_rules(&self, app_id: &str) -> &[AppRule] {
        self.app_id_to_rules
            .get(app_id)
            .map_or(&[], Vec::as_slice)
    }

    /// All groups of one app, disabled ones included.
    pub fn app_all_groups(&self, app_id: &str) -> &[Arc<ResolvedAppGroup>] {
        self.app_id_to_all_groups
            .get(app_id)
            .map_or(&[], Vec::as_slice)
    }

    pub fn slow_group_count(&self) -> usize {
        self.slow_global_groups.len() + self.slow_app_groups.len()
    }

    pub fn counts(&self) -> SummaryCounts {
        SummaryCounts {
            global_groups: self.global_groups.len(),
            global_rules: self.global_rules.len(),
            apps: self.app_id_to_groups.len(),
            app_groups: self.app_id_to_groups.values().map(Vec::len).sum(),
            app_rules: self.app_id_to_rules.values().map(Vec::len).sum(),
            slow_groups: self.slow_group_count(),
        }
    }

    pub fn num_text(&self) -> String {
        self.counts().to_string()
    }
}

/// Aggregate counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub global_groups: usize,
    pub global_rules: usize,
    pub apps: usize,
    pub app_groups: usize,
    pub app_rules: usize,
    pub slow_groups: usize,
}

impl SummaryCounts {
    pub fn rules(&self) -> usize {
        self.global_rules + self.app_rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules() == 0
    }
}

impl fmt::Display for SummaryCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no rules");
        }
        let mut parts = Vec::new();
        if self.global_groups > 0 {
            parts.push(format!("{} global groups", self.global_groups));
        }
        if self.apps > 0 {
            parts.push(format!("{} apps/{} groups", self.apps, self.app_groups));
        }
        parts.push(format!("{} rules", self.rules()));
        if self.slow_groups > 0 {
            parts.push(format!("{} slow", self.slow_groups));
        }
        write!(f, "{}", parts.join("/"))
    }
}

/// Counts restricted to the groups of one subscription.
pub fn subscription_counts(summary: &RuleSummary, subs_id: i64) -> SummaryCounts {
    let global_groups = summary
        .global_groups
        .iter()
        .filter(|g| g.subs_id() == subs_id)
        .count();
    let global_rules = summary
        .global_rules
        .iter()
        .filter(|r| r.group.subs_id() == subs_id)
        .count();

    let mut apps = BTreeSet::new();
    let mut app_groups = 0;
    for group in summary.app_id_to_groups.values().flatten() {
        if group.subs_id() == subs_id {
            apps.insert(group.app_id());
            app_groups += 1;
        }
    }
    let app_rules = summary
        .app_id_to_rules
        .values()
        .flatten()
        .filter(|r| r.group.subs_id() == subs_id)
        .count();
    let slow_groups = summary
        .slow_global_groups
        .iter()
        .filter(|g| g.subs_id() == subs_id)
        .count()
        + summary
            .slow_app_groups
            .iter()
            .filter(|g| g.subs_id() == subs_id)
            .count();

    SummaryCounts {
        global_groups,
        global_rules,
        apps: apps.len(),
        app_groups,
        app_rules,
        slow_groups,
    }
}
