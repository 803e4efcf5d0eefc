//! Host package enumeration.

use std::fs;
use std::path::PathBuf;

use subs_model::AppInfo;

use crate::error::{AppInfoError, Result};

/// Access to the host's installed-package database.
///
/// Calls may block; the cache runs them on the blocking thread pool.
pub trait PackageSource: Send + Sync {
    /// Every installed package.
    fn installed_packages(&self) -> Result<Vec<AppInfo>>;

    /// One package, or `None` when it is not installed.
    fn package(&self, app_id: &str) -> Result<Option<AppInfo>>;
}

/// Package source backed by a JSON manifest listing installed apps.
///
/// The file is re-read on every query so external edits are picked up the
/// same way a live package database would report them. A missing file means
/// nothing is installed.
#[derive(Debug, Clone)]
pub struct ManifestPackageSource {
    path: PathBuf,
}

impl ManifestPackageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<Vec<AppInfo>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(AppInfoError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| AppInfoError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl PackageSource for ManifestPackageSource {
    fn installed_packages(&self) -> Result<Vec<AppInfo>> {
        self.read()
    }

    fn package(&self, app_id: &str) -> Result<Option<AppInfo>> {
        Ok(self.read()?.into_iter().find(|a| a.id == app_id))
    }
}
