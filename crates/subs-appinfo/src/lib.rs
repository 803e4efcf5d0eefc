//! Installed-application cache.
//!
//! Holds the map of installed apps used to decide which app-scoped rule
//! groups apply on this device. The host OS is reached through the
//! [`PackageSource`] trait:
//!
//! - [`AppInfoCache::rebuild_all`] performs a full package scan (cold start,
//!   periodic consistency fallback)
//! - [`AppInfoCache::apply_event`] patches one entry after an
//!   install/uninstall/update notification

mod cache;
mod error;
mod source;

pub use cache::{AppInfoCache, AppMap, PackageEventKind};
pub use error::{AppInfoError, Result};
pub use source::{ManifestPackageSource, PackageSource};
