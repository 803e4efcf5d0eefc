//! App cache error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while querying installed packages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppInfoError {
    /// Package list could not be read.
    #[error("Failed to read package list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package list is malformed.
    #[error("Invalid package list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The host refused or failed a package query.
    #[error("Package query failed: {0}")]
    Source(String),

    /// A blocking package query panicked or was cancelled.
    #[error("Package query task failed: {0}")]
    BackgroundTask(#[from] tokio::task::JoinError),
}

/// Result type alias for app cache operations.
pub type Result<T> = std::result::Result<T, AppInfoError>;
