//! Subscription engine service context.
//!
//! [`SubsContext`] owns every store, the installed-app cache, the resolver
//! task and the update fetcher. It is constructed once at startup and shared
//! (usually behind an `Arc`) with every consumer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use subs_appinfo::ManifestPackageSource;
//! use subs_core::{EngineConfig, SubsContext};
//!
//! async fn run() -> subs_core::Result<()> {
//!     let config = EngineConfig::load()?;
//!     let packages = Arc::new(ManifestPackageSource::new(config.apps_path()));
//!     let context = Arc::new(SubsContext::open(config, packages).await?);
//!     let _updates = context.spawn_periodic_updates();
//!
//!     let mut summary = context.summary();
//!     while summary.changed().await.is_ok() {
//!         println!("{}", summary.borrow().num_text());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod error;

pub use config::{APPS_FILE, DEFAULT_UPDATE_INTERVAL_SECS, EngineConfig, UpdateConfig};
pub use context::SubsContext;
pub use error::{ConfigError, CoreError, Result};
