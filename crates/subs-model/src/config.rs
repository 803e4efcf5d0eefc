//! User override records.
//!
//! Overrides are sparse: a missing record, or a record whose `enable` is
//! `None`, defers to the document default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Granularity a [`SubsConfig`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigScope {
    /// Whole-app applicability, keyed by app id.
    App,
    /// One group inside one app.
    AppGroup,
    /// One global group.
    GlobalGroup,
}

/// A user override of an enable decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsConfig {
    pub subs_id: i64,
    pub scope: ConfigScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<i32>,
    #[serde(default)]
    pub enable: Option<bool>,
}

/// Identity of a [`SubsConfig`]; at most one record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubsConfigKey {
    pub subs_id: i64,
    pub scope: ConfigScope,
    pub app_id: Option<String>,
    pub group_key: Option<i32>,
}

impl SubsConfigKey {
    pub fn app(subs_id: i64, app_id: impl Into<String>) -> Self {
        Self {
            subs_id,
            scope: ConfigScope::App,
            app_id: Some(app_id.into()),
            group_key: None,
        }
    }

    pub fn app_group(subs_id: i64, app_id: impl Into<String>, group_key: i32) -> Self {
        Self {
            subs_id,
            scope: ConfigScope::AppGroup,
            app_id: Some(app_id.into()),
            group_key: Some(group_key),
        }
    }

    pub fn global_group(subs_id: i64, group_key: i32) -> Self {
        Self {
            subs_id,
            scope: ConfigScope::GlobalGroup,
            app_id: None,
            group_key: Some(group_key),
        }
    }
}

impl SubsConfig {
    pub fn app(subs_id: i64, app_id: impl Into<String>, enable: Option<bool>) -> Self {
        Self::from_key(SubsConfigKey::app(subs_id, app_id), enable)
    }

    pub fn app_group(
        subs_id: i64,
        app_id: impl Into<String>,
        group_key: i32,
        enable: Option<bool>,
    ) -> Self {
        Self::from_key(SubsConfigKey::app_group(subs_id, app_id, group_key), enable)
    }

    pub fn global_group(subs_id: i64, group_key: i32, enable: Option<bool>) -> Self {
        Self::from_key(SubsConfigKey::global_group(subs_id, group_key), enable)
    }

    pub fn from_key(key: SubsConfigKey, enable: Option<bool>) -> Self {
        Self {
            subs_id: key.subs_id,
            scope: key.scope,
            app_id: key.app_id,
            group_key: key.group_key,
            enable,
        }
    }

    pub fn key(&self) -> SubsConfigKey {
        SubsConfigKey {
            subs_id: self.subs_id,
            scope: self.scope,
            app_id: self.app_id.clone(),
            group_key: self.group_key,
        }
    }
}

/// Override of a category's default enable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub subs_id: i64,
    pub category_key: i32,
    #[serde(default)]
    pub enable: Option<bool>,
}

/// Every override record, indexed for lookup during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    configs: BTreeMap<SubsConfigKey, SubsConfig>,
    categories: BTreeMap<(i64, i32), CategoryConfig>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from flat record lists; later records win on duplicate keys.
    pub fn from_records(
        configs: impl IntoIterator<Item = SubsConfig>,
        categories: impl IntoIterator<Item = CategoryConfig>,
    ) -> Self {
        let mut overrides = Self::new();
        for config in configs {
            overrides.insert_config(config);
        }
        for category in categories {
            overrides.insert_category(category);
        }
        overrides
    }

    pub fn insert_config(&mut self, config: SubsConfig) -> Option<SubsConfig> {
        self.configs.insert(config.key(), config)
    }

    pub fn remove_config(&mut self, key: &SubsConfigKey) -> Option<SubsConfig> {
        self.configs.remove(key)
    }

    pub fn insert_category(&mut self, config: CategoryConfig) -> Option<CategoryConfig> {
        self.categories
            .insert((config.subs_id, config.category_key), config)
    }

    pub fn remove_category(&mut self, subs_id: i64, category_key: i32) -> Option<CategoryConfig> {
        self.categories.remove(&(subs_id, category_key))
    }

    /// Drop every override belonging to one subscription.
    pub fn remove_subscription(&mut self, subs_id: i64) -> usize {
        let before = self.len();
        self.configs.retain(|key, _| key.subs_id != subs_id);
        self.categories.retain(|(id, _), _| *id != subs_id);
        before - self.len()
    }

    pub fn get(&self, key: &SubsConfigKey) -> Option<&SubsConfig> {
        self.configs.get(key)
    }

    pub fn app_enable(&self, subs_id: i64, app_id: &str) -> Option<bool> {
        self.enable_of(&SubsConfigKey::app(subs_id, app_id))
    }

    pub fn app_group_enable(&self, subs_id: i64, app_id: &str, group_key: i32) -> Option<bool> {
        self.enable_of(&SubsConfigKey::app_group(subs_id, app_id, group_key))
    }

    pub fn global_group_enable(&self, subs_id: i64, group_key: i32) -> Option<bool> {
        self.enable_of(&SubsConfigKey::global_group(subs_id, group_key))
    }

    pub fn category_enable(&self, subs_id: i64, category_key: i32) -> Option<bool> {
        self.categories
            .get(&(subs_id, category_key))
            .and_then(|c| c.enable)
    }

    pub fn configs(&self) -> impl Iterator<Item = &SubsConfig> {
        self.configs.values()
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len() + self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enable_of(&self, key: &SubsConfigKey) -> Option<bool> {
        self.configs.get(key).and_then(|c| c.enable)
    }
}
