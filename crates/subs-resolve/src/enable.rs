//! Layered enable resolution.
//!
//! Every tier is an `Option<bool>`; `None` defers to the next tier. Tiers are
//! never collapsed to a boolean before the final step.

use subs_model::{Overrides, RawGroup, RawSubscription};

/// The tiers consulted, in priority order, to decide whether a group is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnableTiers {
    /// User override of this exact group.
    pub group_override: Option<bool>,
    /// User override of the group's category.
    pub category_override: Option<bool>,
    /// The category's declared default.
    pub category_default: Option<bool>,
    /// The group's declared default.
    pub group_default: Option<bool>,
}

impl EnableTiers {
    /// First decided tier wins; with no decision anywhere the group is on.
    pub fn resolve(&self) -> bool {
        self.group_override
            .or(self.category_override)
            .or(self.category_default)
            .or(self.group_default)
            .unwrap_or(true)
    }
}

/// Collect the enable tiers of an app group.
///
/// Category tiers are only consulted when the group names a category the
/// document declares.
pub fn app_group_tiers(
    subscription: &RawSubscription,
    overrides: &Overrides,
    app_id: &str,
    group: &RawGroup,
) -> EnableTiers {
    let category = group
        .category_key
        .and_then(|key| subscription.category(key));
    EnableTiers {
        group_override: overrides.app_group_enable(subscription.id, app_id, group.key),
        category_override: category.and_then(|c| overrides.category_enable(subscription.id, c.key)),
        category_default: category.and_then(|c| c.enable),
        group_default: group.enable,
    }
}

/// Effective enable of an app group.
pub fn group_raw_enable(
    subscription: &RawSubscription,
    overrides: &Overrides,
    app_id: &str,
    group: &RawGroup,
) -> bool {
    app_group_tiers(subscription, overrides, app_id, group).resolve()
}

/// Effective enable of a global group: override, then group default, then on.
pub fn global_group_enable(
    subscription: &RawSubscription,
    overrides: &Overrides,
    group: &RawGroup,
) -> bool {
    overrides
        .global_group_enable(subscription.id, group.key)
        .or(group.enable)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use subs_model::{CategoryConfig, RawCategory, RawRule, SubsConfig};

    const TRI: [Option<bool>; 3] = [None, Some(false), Some(true)];

    /// Independent statement of the priority order.
    fn expected(tiers: &EnableTiers) -> bool {
        if let Some(v) = tiers.group_override {
            return v;
        }
        if let Some(v) = tiers.category_override {
            return v;
        }
        if let Some(v) = tiers.category_default {
            return v;
        }
        if let Some(v) = tiers.group_default {
            return v;
        }
        true
    }

    #[test]
    fn test_full_tier_matrix() {
        for group_override in TRI {
            for category_override in TRI {
                for category_default in TRI {
                    for group_default in TRI {
                        let tiers = EnableTiers {
                            group_override,
                            category_override,
                            category_default,
                            group_default,
                        };
                        assert_eq!(tiers.resolve(), expected(&tiers), "{tiers:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_category_default_beats_group_default() {
        let tiers = EnableTiers {
            category_default: Some(true),
            group_default: Some(false),
            ..EnableTiers::default()
        };
        assert!(tiers.resolve());
    }

    fn document() -> (RawSubscription, RawGroup) {
        let mut subscription = RawSubscription::new(-1, "Local", 1);
        subscription.categories.push(RawCategory {
            key: 1,
            name: "Ads".to_string(),
            enable: Some(true),
        });
        let mut group = RawGroup::new(0, "g1");
        group.category_key = Some(1);
        group.rules.push(RawRule::with_match("[id=x]"));
        (subscription, group)
    }

    #[test]
    fn test_tiers_read_from_records() {
        let (subscription, group) = document();
        let overrides = Overrides::from_records(
            [SubsConfig::app_group(-1, "app", 0, None)],
            [CategoryConfig {
                subs_id: -1,
                category_key: 1,
                enable: Some(false),
            }],
        );

        let tiers = app_group_tiers(&subscription, &overrides, "app", &group);

        assert_eq!(
            tiers,
            EnableTiers {
                group_override: None,
                category_override: Some(false),
                category_default: Some(true),
                group_default: None,
            }
        );
        // Category override wins over category default.
        assert!(!group_raw_enable(&subscription, &overrides, "app", &group));
    }

    #[test]
    fn test_group_override_wins() {
        let (subscription, group) = document();
        let overrides = Overrides::from_records(
            [SubsConfig::app_group(-1, "app", 0, Some(true))],
            [CategoryConfig {
                subs_id: -1,
                category_key: 1,
                enable: Some(false),
            }],
        );
        assert!(group_raw_enable(&subscription, &overrides, "app", &group));
    }

    #[test]
    fn test_global_group_enable() {
        let (subscription, mut group) = document();
        let none = Overrides::new();
        assert!(global_group_enable(&subscription, &none, &group));

        group.enable = Some(false);
        assert!(!global_group_enable(&subscription, &none, &group));

        let forced = Overrides::from_records([SubsConfig::global_group(-1, 0, Some(true))], []);
        assert!(global_group_enable(&subscription, &forced, &group));
    }
}
