//! Error types for subscription updates.

use subs_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur while refreshing a subscription.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Response body was not a valid document.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The accepted document could not be stored.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl UpdateError {
    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the subscription server. Please check your internet connection."
                    .to_string()
            }
            Self::HttpStatus { status: 404, .. } => {
                "The subscription was not found at its update address.".to_string()
            }
            Self::HttpStatus { .. } => "The subscription server returned an error.".to_string(),
            Self::JsonParse(_) => "The downloaded subscription is not valid.".to_string(),
            Self::Persistence(e) => e.user_message(),
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::JsonParse(_) | Self::Persistence(_) => false,
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::JsonParse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

impl From<subs_model::ModelError> for UpdateError {
    fn from(err: subs_model::ModelError) -> Self {
        Self::JsonParse(err.to_string())
    }
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
