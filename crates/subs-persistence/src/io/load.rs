//! Subscription loading operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use subs_model::RawSubscription;

use crate::error::{PersistenceError, Result};

/// Subscription document file names: `<id>.json`, id possibly negative.
static SUBSCRIPTION_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.json$").expect("Invalid subscription file regex"));

/// Whether a file name looks like a subscription document (`<id>.json`).
pub fn is_subscription_file_name(name: &str) -> bool {
    SUBSCRIPTION_FILE.is_match(name)
}

/// Load and validate a single subscription document.
pub fn load_subscription(path: &Path) -> Result<RawSubscription> {
    let text = fs::read_to_string(path).map_err(|e| PersistenceError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    RawSubscription::from_json(&text).map_err(|e| PersistenceError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load every subscription document in a directory.
///
/// Files that fail to read or parse, or whose document id differs from the
/// id in the file name, are logged and skipped; one bad file never blocks
/// the others. Each id is therefore loaded from at most one file. A missing directory yields an empty list. The
/// result is ordered by subscription id.
pub fn scan_subscriptions(dir: &Path) -> Result<Vec<RawSubscription>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Subscriptions directory {} does not exist yet", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(PersistenceError::Io {
                operation: "list",
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let mut loaded = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_subscription_file_name(name) {
            continue;
        }

        match load_subscription(&path) {
            Ok(subscription) if file_id(&path) == Some(subscription.id) => {
                loaded.push(subscription);
            }
            Ok(subscription) => {
                tracing::warn!(
                    subs_id = subscription.id,
                    "Skipping {}: id does not match file name",
                    path.display()
                );
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    loaded.sort_by_key(|s| s.id);
    tracing::info!("Loaded {} subscriptions from {}", loaded.len(), dir.display());
    Ok(loaded)
}

/// Scan the subscriptions directory asynchronously.
pub async fn scan_subscriptions_async(dir: PathBuf) -> Result<Vec<RawSubscription>> {
    tokio::task::spawn_blocking(move || scan_subscriptions(&dir))
        .await
        .map_err(|source| PersistenceError::BackgroundTask { source })?
}

fn file_id(path: &Path) -> Option<i64> {
    path.file_stem()?.to_str()?.parse().ok()
}
