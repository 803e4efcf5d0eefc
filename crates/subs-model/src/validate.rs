//! Structural validation of subscription groups.
//!
//! A group that fails any check is kept in the document with `valid = false`
//! so the rest of the document stays usable.

use std::collections::HashSet;

use crate::subscription::{RawGroup, RawSubscription};

/// Where a group sits in its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    Global,
    App(String),
}

/// A group that failed validation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIssue {
    pub scope: GroupScope,
    pub key: i32,
    pub name: String,
    pub problem: String,
}

/// Recompute the `valid` flag of every group in the document.
///
/// Returns the number of groups marked invalid.
pub fn validate_subscription(subscription: &mut RawSubscription) -> usize {
    let category_keys = category_keys(subscription);
    let mut invalid = validate_scope(&mut subscription.global_groups, &category_keys);
    for app in &mut subscription.apps {
        invalid += validate_scope(&mut app.groups, &category_keys);
    }
    invalid
}

/// List every invalid group of the document in declaration order.
pub fn group_issues(subscription: &RawSubscription) -> Vec<GroupIssue> {
    let category_keys = category_keys(subscription);
    let scopes = std::iter::once((GroupScope::Global, &subscription.global_groups)).chain(
        subscription
            .apps
            .iter()
            .map(|app| (GroupScope::App(app.id.clone()), &app.groups)),
    );

    let mut issues = Vec::new();
    for (scope, groups) in scopes {
        for (group, problem) in groups.iter().zip(scope_problems(groups, &category_keys)) {
            if let Some(problem) = problem {
                issues.push(GroupIssue {
                    scope: scope.clone(),
                    key: group.key,
                    name: group.name.clone(),
                    problem,
                });
            }
        }
    }
    issues
}

fn category_keys(subscription: &RawSubscription) -> HashSet<i32> {
    subscription.categories.iter().map(|c| c.key).collect()
}

fn validate_scope(groups: &mut [RawGroup], category_keys: &HashSet<i32>) -> usize {
    let problems = scope_problems(groups, category_keys);
    let mut invalid = 0;
    for (group, problem) in groups.iter_mut().zip(problems) {
        group.valid = problem.is_none();
        if !group.valid {
            invalid += 1;
        }
    }
    invalid
}

/// Problem of each group in one scope; later duplicates of a key are invalid.
fn scope_problems(groups: &[RawGroup], category_keys: &HashSet<i32>) -> Vec<Option<String>> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .map(|group| {
            if !seen.insert(group.key) {
                return Some(format!("duplicate group key {}", group.key));
            }
            group_problem(group, category_keys)
        })
        .collect()
}

/// Describe the first structural problem of a group, if any.
///
/// Does not consider key uniqueness, which depends on the enclosing scope.
pub fn group_problem(group: &RawGroup, category_keys: &HashSet<i32>) -> Option<String> {
    if group.rules.is_empty() {
        return Some("group has no rules".to_string());
    }
    if let Some(category) = group.category_key
        && !category_keys.contains(&category)
    {
        return Some(format!("unknown category key {category}"));
    }

    let mut rule_keys = HashSet::new();
    for (index, rule) in group.rules.iter().enumerate() {
        if rule.matches.is_empty() || rule.matches.iter().any(|m| m.trim().is_empty()) {
            return Some(format!("rule #{index} has an empty selector list"));
        }
        if let Some(key) = rule.key
            && !rule_keys.insert(key)
        {
            return Some(format!("duplicate rule key {key}"));
        }
    }

    group
        .rules
        .iter()
        .flat_map(|r| r.pre_keys.iter())
        .find(|k| !rule_keys.contains(k))
        .map(|k| format!("preKeys references unknown rule key {k}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{RawApp, RawCategory, RawRule};

    fn group(key: i32) -> RawGroup {
        let mut g = RawGroup::new(key, format!("g{key}"));
        g.rules.push(RawRule::with_match("[id=ok]"));
        g
    }

    #[test]
    fn test_valid_document() {
        let mut sub = RawSubscription::new(1, "s", 1);
        sub.global_groups.push(group(0));
        sub.apps.push(RawApp {
            id: "a".to_string(),
            name: None,
            groups: vec![group(0), group(1)],
        });
        assert_eq!(validate_subscription(&mut sub), 0);
        assert!(sub.global_groups[0].valid);
    }

    #[test]
    fn test_duplicate_key_marks_later_group() {
        let mut sub = RawSubscription::new(1, "s", 1);
        sub.global_groups = vec![group(3), group(3)];
        assert_eq!(validate_subscription(&mut sub), 1);
        assert!(sub.global_groups[0].valid);
        assert!(!sub.global_groups[1].valid);
    }

    #[test]
    fn test_same_key_in_different_scopes_is_fine() {
        let mut sub = RawSubscription::new(1, "s", 1);
        sub.global_groups.push(group(0));
        for id in ["a", "b"] {
            sub.apps.push(RawApp {
                id: id.to_string(),
                name: None,
                groups: vec![group(0)],
            });
        }
        assert_eq!(validate_subscription(&mut sub), 0);
    }

    #[test]
    fn test_unknown_category() {
        let mut sub = RawSubscription::new(1, "s", 1);
        sub.categories.push(RawCategory {
            key: 1,
            name: "c".to_string(),
            enable: None,
        });
        let mut known = group(0);
        known.category_key = Some(1);
        let mut unknown = group(1);
        unknown.category_key = Some(2);
        sub.global_groups = vec![known, unknown];

        validate_subscription(&mut sub);
        assert!(sub.global_groups[0].valid);
        assert!(!sub.global_groups[1].valid);
    }

    #[test]
    fn test_group_issues_name_scope_and_reason() {
        let mut sub = RawSubscription::new(1, "s", 1);
        sub.global_groups = vec![group(3), group(3)];
        sub.apps.push(RawApp {
            id: "a".to_string(),
            name: None,
            groups: vec![RawGroup::new(0, "empty")],
        });

        let issues = group_issues(&sub);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].scope, GroupScope::Global);
        assert!(issues[0].problem.contains("duplicate"));
        assert_eq!(issues[1].scope, GroupScope::App("a".to_string()));
        assert_eq!(issues[1].name, "empty");
    }

    #[test]
    fn test_rule_problems() {
        let keys = HashSet::new();

        let empty = RawGroup::new(0, "empty");
        assert!(group_problem(&empty, &keys).is_some());

        let mut blank = group(0);
        blank.rules.push(RawRule::with_match("  "));
        assert!(group_problem(&blank, &keys).unwrap().contains("selector"));

        let mut dangling = group(0);
        dangling.rules[0].pre_keys = vec![9];
        assert!(group_problem(&dangling, &keys).unwrap().contains("preKeys"));

        let mut chained = group(0);
        chained.rules[0].key = Some(1);
        chained.rules.push(RawRule {
            key: Some(2),
            pre_keys: vec![1],
            ..RawRule::with_match("[id=next]")
        });
        assert!(group_problem(&chained, &keys).is_none());

        let mut dup = group(0);
        dup.rules[0].key = Some(1);
        dup.rules.push(RawRule {
            key: Some(1),
            ..RawRule::with_match("[id=y]")
        });
        assert!(group_problem(&dup, &keys).unwrap().contains("duplicate"));
    }
}
