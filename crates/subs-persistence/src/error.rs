//! Persistence error types.
//!
//! All persistence operations return structured errors that provide
//! user-friendly messages for surfacing in the UI.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A subscription document could not be parsed.
    #[error("Invalid subscription file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: subs_model::ModelError,
    },

    /// A record file could not be decoded.
    #[error("Invalid record file: {path}")]
    Records {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("Failed to serialize data")]
    Serialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking I/O task panicked or was cancelled.
    #[error("Background I/O task failed")]
    BackgroundTask {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl PersistenceError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::Parse { path, .. } => {
                format!(
                    "The subscription file at {} is damaged and was ignored.",
                    path.display()
                )
            }
            Self::Records { path, .. } => {
                format!("The settings file at {} could not be read.", path.display())
            }
            Self::Serialization { .. } => {
                "An error occurred while saving the subscription.".to_string()
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
            Self::BackgroundTask { .. } => "A background save was interrupted.".to_string(),
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = PersistenceError::Io {
            operation: "write",
            path: PathBuf::from("/tmp/x.json"),
            source: std::io::Error::other("disk full"),
        };
        assert!(err.user_message().contains("write"));

        let err = PersistenceError::AtomicWriteFailed {
            temp_path: PathBuf::from("/tmp/1.json.tmp"),
            target_path: PathBuf::from("/tmp/1.json"),
            source: std::io::Error::other("rename"),
        };
        assert!(err.user_message().contains("disk space"));
    }
}
