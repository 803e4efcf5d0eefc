//! Engine configuration.
//!
//! Stored as TOML in the platform config directory. Every key is optional;
//! a missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use subs_persistence::{ITEMS_FILE, OVERRIDES_FILE, SUBSCRIPTIONS_DIR};

use crate::error::ConfigError;

/// Installed-app manifest file name, relative to the data dir.
pub const APPS_FILE: &str = "apps.json";

const CONFIG_FILE: &str = "config.toml";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of all persisted state.
    pub data_dir: PathBuf,
    pub updates: UpdateConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            updates: UpdateConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration rooted at `data_dir` with default update settings.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            updates: UpdateConfig::default(),
        }
    }

    /// Load from the default config path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Get the default data directory.
    pub fn default_data_dir() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn subscriptions_dir(&self) -> PathBuf {
        self.data_dir.join(SUBSCRIPTIONS_DIR)
    }

    pub fn items_path(&self) -> PathBuf {
        self.data_dir.join(ITEMS_FILE)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.data_dir.join(OVERRIDES_FILE)
    }

    pub fn apps_path(&self) -> PathBuf {
        self.data_dir.join(APPS_FILE)
    }
}

/// Remote update settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Whether periodic update checks run.
    pub enabled: bool,
    pub interval_secs: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Default time between update checks (6 hours).
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 6 * 60 * 60;

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            timeout_secs: subs_updater::DEFAULT_TIMEOUT.as_secs(),
            user_agent: subs_updater::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UpdateConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "SubsEngine", "subs-engine")
}
