//! Subscription saving operations.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subs_model::RawSubscription;

use crate::error::{PersistenceError, Result};

/// Path of the document file for a subscription id.
pub fn subscription_path(dir: &Path, id: i64) -> PathBuf {
    dir.join(format!("{id}.json"))
}

/// Write bytes to a file atomically.
///
/// Uses a temp file + rename so a crash or power loss never leaves a
/// half-written file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| PersistenceError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(bytes).map_err(|e| PersistenceError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| PersistenceError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| PersistenceError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// Save a subscription document to `<dir>/<id>.json`.
pub fn save_subscription(dir: &Path, subscription: &RawSubscription) -> Result<PathBuf> {
    let json = subscription
        .to_json_pretty()
        .map_err(|e| PersistenceError::Serialization {
            source: Box::new(e),
        })?;

    let path = subscription_path(dir, subscription.id);
    write_atomic(&path, json.as_bytes())?;

    tracing::debug!(
        subs_id = subscription.id,
        version = subscription.version,
        "Saved subscription to {}",
        path.display()
    );
    Ok(path)
}

/// Save a subscription asynchronously.
///
/// Spawns the save operation on a blocking thread pool to avoid
/// blocking the async runtime.
pub async fn save_subscription_async(
    dir: PathBuf,
    subscription: Arc<RawSubscription>,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || save_subscription(&dir, &subscription))
        .await
        .map_err(|source| PersistenceError::BackgroundTask { source })?
}

/// Delete the document file of a subscription. A missing file is not an error.
pub fn delete_subscription_file(dir: &Path, id: i64) -> Result<()> {
    let path = subscription_path(dir, id);
    match fs::remove_file(&path) {
        Ok(()) => {
            tracing::debug!(subs_id = id, "Deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PersistenceError::Io {
            operation: "delete",
            path,
            source: e,
        }),
    }
}
