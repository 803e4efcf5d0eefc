//! Resolution of subscriptions into active rule sets.
//!
//! This crate combines raw subscription documents, install records, user
//! overrides and installed-app state into a [`RuleSummary`]:
//!
//! - [`resolve`]: the pure merge pass
//! - [`spawn_resolver`]: a task republishing the summary whenever an input changes
//! - [`EnableTiers`]: the layered group enable decision
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use subs_model::{Overrides, RawGroup, RawRule, RawSubscription, SubsItem};
//! use subs_resolve::{ResolveInput, resolve};
//!
//! let mut sub = RawSubscription::new(-1, "Local", 1);
//! let mut group = RawGroup::new(0, "Skip splash");
//! group.rules.push(RawRule::with_match("[text=Skip]"));
//! sub.global_groups.push(group);
//!
//! let items = vec![SubsItem::new(-1, 0, None)];
//! let subscriptions = BTreeMap::from([(-1, Arc::new(sub))]);
//! let summary = resolve(&ResolveInput {
//!     items: &items,
//!     subscriptions: &subscriptions,
//!     apps: &BTreeMap::new(),
//!     overrides: &Overrides::new(),
//! });
//! assert_eq!(summary.global_rules.len(), 1);
//! ```

pub mod enable;
mod engine;
mod group;
mod resolve;
mod summary;

pub use enable::{EnableTiers, app_group_tiers, global_group_enable, group_raw_enable};
pub use engine::{InputSnapshot, ResolverInputs, spawn_resolver};
pub use group::{AppRule, GlobalRule, ResolvedAppGroup, ResolvedGlobalGroup};
pub use resolve::{ResolveInput, resolve};
pub use summary::{RuleSummary, SummaryCounts, subscription_counts};
