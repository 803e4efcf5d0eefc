//! File I/O for subscription documents.
//!
//! This module handles:
//! - Saving documents with atomic writes
//! - Loading single documents and scanning the subscriptions directory

mod load;
mod save;

pub use load::{
    is_subscription_file_name, load_subscription, scan_subscriptions, scan_subscriptions_async,
};
pub use save::{
    delete_subscription_file, save_subscription, save_subscription_async, subscription_path,
    write_atomic,
};
