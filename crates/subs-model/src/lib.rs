//! Data model for rule subscriptions.
//!
//! A subscription is a versioned JSON document declaring rule groups, either
//! global or scoped to one app. Around it sit three kinds of records:
//!
//! - [`SubsItem`]: install record (enable flag, display order, update URL)
//! - [`SubsConfig`]: sparse user override at app, app-group or global-group scope
//! - [`CategoryConfig`]: user override of a category's default enable
//!
//! plus [`AppInfo`], the installed-application metadata used to decide which
//! app scopes apply on this device.
//!
//! # Module Organization
//!
//! - [`subscription`]: raw subscription documents and their groups/rules
//! - [`validate`]: structural checks that set each group's `valid` flag
//! - [`item`]: install records
//! - [`config`]: override records and their keys
//! - [`app`]: installed-app metadata

pub mod app;
pub mod config;
pub mod error;
pub mod item;
pub mod subscription;
pub mod validate;

pub use app::AppInfo;
pub use config::{CategoryConfig, ConfigScope, Overrides, SubsConfig, SubsConfigKey};
pub use error::{ModelError, Result};
pub use item::SubsItem;
pub use subscription::{
    RawApp, RawCategory, RawGroup, RawRule, RawSubscription, VersionDescriptor,
};
pub use validate::{GroupIssue, GroupScope, group_issues, validate_subscription};
