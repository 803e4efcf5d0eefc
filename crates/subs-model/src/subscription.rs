//! Raw subscription documents.
//!
//! These mirror the on-disk and over-the-wire JSON format one to one.
//! Field names are camelCase in JSON.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::validate::validate_subscription;

/// Rules whose match window exceeds this are candidates for the slow lane.
pub const SLOW_MATCH_TIME_MS: u64 = 10_000;

/// A parsed subscription document.
///
/// Negative ids are locally authored; non-negative ids come from a remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubscription {
    pub id: i64,
    pub name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_uri: Option<String>,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
    #[serde(default)]
    pub global_groups: Vec<RawGroup>,
    #[serde(default)]
    pub apps: Vec<RawApp>,
}

impl RawSubscription {
    /// Create an empty document.
    pub fn new(id: i64, name: impl Into<String>, version: u32) -> Self {
        Self {
            id,
            name: name.into(),
            version,
            author: None,
            update_url: None,
            check_update_url: None,
            support_uri: None,
            categories: Vec::new(),
            global_groups: Vec::new(),
            apps: Vec::new(),
        }
    }

    /// Parse a document and run structural validation over its groups.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut subscription: Self = serde_json::from_str(text).map_err(ModelError::Parse)?;
        validate_subscription(&mut subscription);
        Ok(subscription)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| ModelError::Encode {
            id: self.id,
            source,
        })
    }

    /// Whether this document was authored on the device.
    #[inline]
    pub fn is_local(&self) -> bool {
        self.id < 0
    }

    pub fn category(&self, key: i32) -> Option<&RawCategory> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn app(&self, app_id: &str) -> Option<&RawApp> {
        self.apps.iter().find(|a| a.id == app_id)
    }

    pub fn global_group(&self, key: i32) -> Option<&RawGroup> {
        self.global_groups.iter().find(|g| g.key == key)
    }

    /// Number of app groups across every declared app.
    pub fn app_group_count(&self) -> usize {
        self.apps.iter().map(|a| a.groups.len()).sum()
    }
}

/// A cross-cutting label groups may reference by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    pub key: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// Groups declared for one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawApp {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
}

/// A named, independently enable-able collection of rules.
///
/// The same shape is used for global groups and app groups; the scope is
/// given by where the group sits in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroup {
    pub key: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_key: Option<i32>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
    /// Cleared by [`validate_subscription`] when the group fails structural checks.
    #[serde(skip, default = "default_true")]
    pub valid: bool,
}

impl RawGroup {
    pub fn new(key: i32, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            desc: None,
            enable: None,
            category_key: None,
            rules: Vec::new(),
            valid: true,
        }
    }
}

/// A single rule definition.
///
/// Selectors are kept as opaque strings; matching them against a live UI
/// tree is the execution engine's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_keys: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Milliseconds after activation during which the rule may match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_maximum: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_find: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,

    // ─── App version filters ────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_codes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_version_codes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_version_names: Vec<String>,
}

impl RawRule {
    /// Rule with a single selector.
    pub fn with_match(selector: impl Into<String>) -> Self {
        Self {
            matches: vec![selector.into()],
            ..Self::default()
        }
    }

    /// Whether matching this rule is expensive enough for the slow lane.
    ///
    /// A rule is slow when nothing bounds how often or how long it is tried:
    /// no prerequisite rules, no quick-find hint, an open-ended match window
    /// and no single-shot action limit.
    pub fn is_slow(&self) -> bool {
        self.pre_keys.is_empty()
            && !self.quick_find.unwrap_or(false)
            && self.match_time.is_none_or(|t| t > SLOW_MATCH_TIME_MS)
            && self.action_maximum.is_none_or(|m| m > 1)
    }

    /// Whether the rule applies to the given installed app version.
    ///
    /// `None` means the version is unknown, in which case filters are ignored.
    pub fn matches_app_version(&self, version_code: Option<i64>, version_name: Option<&str>) -> bool {
        if let Some(code) = version_code {
            if self.exclude_version_codes.contains(&code) {
                return false;
            }
            if !self.version_codes.is_empty() && !self.version_codes.contains(&code) {
                return false;
            }
        }
        if let Some(name) = version_name {
            if self.exclude_version_names.iter().any(|n| n == name) {
                return false;
            }
            if !self.version_names.is_empty() && !self.version_names.iter().any(|n| n == name) {
                return false;
            }
        }
        true
    }
}

/// Lightweight descriptor served by a subscription's check URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub id: i64,
    pub version: u32,
}

fn default_true() -> bool {
    true
}
