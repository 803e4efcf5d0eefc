//! Remote refresh of installed subscriptions.
//!
//! A pass over the install registry fetches each enabled subscription's
//! remote document and stores it when it carries a strictly newer version:
//!
//! - an optional check URL is consulted first; an unchanged announced
//!   version ends the check for that subscription without a full download
//! - a fetched document whose id differs from the installed one, or whose
//!   version does not advance, is silently dropped
//! - per-subscription failures are logged and reported, never fatal to the pass
//!
//! Network access goes through the [`SubscriptionFetcher`] trait; [`HttpFetcher`]
//! is the reqwest-based implementation.
//!
//! # Example
//!
//! ```no_run
//! use subs_persistence::{ItemRegistry, RawSubscriptionStore, RecordFile};
//! use subs_updater::{HttpFetcher, check_updates};
//!
//! async fn refresh() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RawSubscriptionStore::new("data/subscriptions");
//!     store.load_all().await?;
//!     let registry = ItemRegistry::open(RecordFile::at("data/items.json"), "data/subscriptions")?;
//!
//!     let report = check_updates(&store, &registry, &HttpFetcher::new()?).await;
//!     println!("{} updated", report.updated.len());
//!     Ok(())
//! }
//! ```

mod check;
mod client;
mod error;
mod gate;

pub use check::{UpdateReport, check_updates};
pub use client::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpFetcher, SubscriptionFetcher};
pub use error::{Result, UpdateError};
pub use gate::accepts_update;
