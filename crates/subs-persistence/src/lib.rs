//! Persistent storage for subscriptions and their surrounding records.
//!
//! This crate owns every piece of mutable state the resolution engine reads,
//! except installed-app metadata:
//!
//! - [`RawSubscriptionStore`]: the in-memory `id -> document` map, backed by
//!   one `<id>.json` file per subscription and guarded by a store-wide lock
//! - [`ItemRegistry`]: install records ([`SubsItem`](subs_model::SubsItem))
//! - [`OverrideStore`]: user overrides at group, app and category granularity
//!
//! Each store publishes immutable snapshots through a `tokio::sync::watch`
//! channel; readers never see a partially applied mutation.
//!
//! # On-disk layout
//!
//! ```text
//! <data_dir>/
//! ├── subscriptions/
//! │   ├── -1.json          # locally authored
//! │   └── 42.json          # remote sourced
//! ├── items.json           # install records
//! └── overrides.json       # group/app/category overrides
//! ```
//!
//! All files are written atomically (temp file + rename).

mod error;
mod io;
mod overrides;
mod raw_store;
mod records;
mod registry;

pub use error::{PersistenceError, Result};
pub use io::{
    delete_subscription_file, is_subscription_file_name, load_subscription, save_subscription,
    save_subscription_async, scan_subscriptions, scan_subscriptions_async, subscription_path,
    write_atomic,
};
pub use overrides::{OverrideRecords, OverrideStore};
pub use raw_store::{RawSubscriptionStore, StoreGuard, SubscriptionMap};
pub use records::RecordFile;
pub use registry::ItemRegistry;

/// Directory holding subscription documents, relative to the data dir.
pub const SUBSCRIPTIONS_DIR: &str = "subscriptions";

/// Install record file name, relative to the data dir.
pub const ITEMS_FILE: &str = "items.json";

/// Override record file name, relative to the data dir.
pub const OVERRIDES_FILE: &str = "overrides.json";
