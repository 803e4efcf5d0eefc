//! Error types for the service context.

use std::path::PathBuf;

use subs_appinfo::AppInfoError;
use subs_persistence::PersistenceError;
use subs_updater::UpdateError;
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors surfaced by [`SubsContext`](crate::SubsContext) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    AppInfo(#[from] AppInfoError),

    /// The subscription is already installed.
    #[error("subscription {0} is already installed")]
    AlreadyInstalled(i64),

    /// No subscription with this id is installed.
    #[error("subscription {0} is not installed")]
    NotInstalled(i64),

    /// A remote source served a document with a local (negative) id.
    #[error("remote document has local id {0}")]
    LocalIdFromRemote(i64),
}

impl CoreError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.to_string(),
            Self::Persistence(e) => e.user_message(),
            Self::Update(e) => e.user_message(),
            Self::AppInfo(_) => "Could not read the list of installed apps.".to_string(),
            Self::AlreadyInstalled(id) => format!("Subscription {id} is already installed."),
            Self::NotInstalled(id) => format!("Subscription {id} is not installed."),
            Self::LocalIdFromRemote(_) => {
                "The downloaded subscription has an invalid id.".to_string()
            }
        }
    }
}

/// Result type alias for context operations.
pub type Result<T> = std::result::Result<T, CoreError>;
