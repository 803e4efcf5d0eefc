//! Offline checks of subscription files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use subs_model::{GroupIssue, RawSubscription, group_issues};

/// Validation outcome of one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub id: i64,
    pub name: String,
    pub version: u32,
    pub groups: usize,
    pub rules: usize,
    pub issues: Vec<GroupIssue>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parse a subscription file and list its invalid groups.
///
/// Fails only when the file cannot be read or is not a subscription document.
pub fn validate_file(path: &Path) -> Result<FileReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let subscription = RawSubscription::from_json(&text)
        .with_context(|| format!("parse {}", path.display()))?;

    let all_groups = subscription
        .global_groups
        .iter()
        .chain(subscription.apps.iter().flat_map(|app| app.groups.iter()));
    let (groups, rules) = all_groups.fold((0, 0), |(groups, rules), group| {
        (groups + 1, rules + group.rules.len())
    });

    Ok(FileReport {
        path: path.to_path_buf(),
        id: subscription.id,
        name: subscription.name.clone(),
        version: subscription.version,
        groups,
        rules,
        issues: group_issues(&subscription),
    })
}
